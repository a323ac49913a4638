use crate::error::DbError;
use crate::tuple::Tuple;

/// Comparison operators available on [`crate::fields::FieldVal`].
///
/// `Like` degenerates to `Equals` on `Int` fields.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Op {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEq,
    GreaterThan,
    GreaterThanOrEq,
    Like,
}

/// A single-field predicate evaluated against a constant operand:
/// `tuple.field[field_index] OP operand`.
#[derive(Debug, Clone)]
pub struct Predicate {
    field_index: usize,
    op: Op,
    operand: crate::fields::FieldVal,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, operand: crate::fields::FieldVal) -> Self {
        Predicate {
            field_index,
            op,
            operand,
        }
    }

    pub fn filter(&self, t: &Tuple) -> Result<bool, DbError> {
        let field = t
            .get_field(self.field_index)
            .ok_or(DbError::FieldNotFound(self.field_index.to_string()))?;
        field.compare(self.op, &self.operand)
    }
}

/// A predicate comparing one field of a left tuple against one field of a
/// right tuple, as consumed by [`crate::operators::join::Join`].
#[derive(Debug, Clone)]
pub struct JoinPredicate {
    left_index: usize,
    op: Op,
    right_index: usize,
}

impl JoinPredicate {
    pub fn new(left_index: usize, op: Op, right_index: usize) -> Self {
        JoinPredicate {
            left_index,
            op,
            right_index,
        }
    }

    pub fn filter(&self, left: &Tuple, right: &Tuple) -> Result<bool, DbError> {
        let lf = left
            .get_field(self.left_index)
            .ok_or(DbError::FieldNotFound(self.left_index.to_string()))?;
        let rf = right
            .get_field(self.right_index)
            .ok_or(DbError::FieldNotFound(self.right_index.to_string()))?;
        lf.compare(self.op, rf)
    }
}
