use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

use crate::error::DbError;
use crate::predicate::Op;
use crate::types::Type;

/// A concrete cell value. Two fields are only comparable when their
/// underlying types match.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum FieldVal {
    Int(IntField),
    Str(StringField),
}

impl FieldVal {
    pub fn into_int(self) -> Option<IntField> {
        match self {
            FieldVal::Int(f) => Some(f),
            _ => None,
        }
    }

    pub fn into_str(self) -> Option<StringField> {
        match self {
            FieldVal::Str(f) => Some(f),
            _ => None,
        }
    }

    pub fn get_type(&self) -> Type {
        match self {
            FieldVal::Int(_) => Type::Int,
            FieldVal::Str(f) => Type::Str(f.max_len),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            FieldVal::Int(f) => f.serialize(),
            FieldVal::Str(f) => f.serialize(),
        }
    }

    /// Total ordering used to sort tuples (e.g. [`crate::operators::order_by::OrderBy`]).
    /// Errors if `self` and `other` carry different field kinds.
    pub fn cmp(&self, other: &FieldVal) -> Result<Ordering, DbError> {
        match (self, other) {
            (FieldVal::Int(a), FieldVal::Int(b)) => Ok(a.value.cmp(&b.value)),
            (FieldVal::Str(a), FieldVal::Str(b)) => Ok(a.value.cmp(&b.value)),
            _ => Err(DbError::SchemaMismatch(
                "cannot compare fields of different types".to_string(),
            )),
        }
    }

    /// Evaluates `self OP other`. `Like` on `Int` degenerates to `Equals`.
    /// Errors if the two fields carry different kinds.
    pub fn compare(&self, op: Op, other: &FieldVal) -> Result<bool, DbError> {
        if matches!(self, FieldVal::Int(_)) != matches!(other, FieldVal::Int(_)) {
            return Err(DbError::SchemaMismatch(
                "cannot compare fields of different types".to_string(),
            ));
        }
        let op = if op == Op::Like && matches!(self, FieldVal::Int(_)) {
            Op::Equals
        } else {
            op
        };
        let ord = self.cmp(other)?;
        Ok(match op {
            Op::Equals | Op::Like => ord == Ordering::Equal,
            Op::NotEquals => ord != Ordering::Equal,
            Op::LessThan => ord == Ordering::Less,
            Op::LessThanOrEq => ord != Ordering::Greater,
            Op::GreaterThan => ord == Ordering::Greater,
            Op::GreaterThanOrEq => ord != Ordering::Less,
        })
    }
}

impl Display for FieldVal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FieldVal::Int(v) => write!(f, "{}", v.value),
            FieldVal::Str(v) => write!(f, "{}", v.value),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct IntField {
    value: i32,
}

impl IntField {
    pub fn new(value: i32) -> Self {
        IntField { value }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    fn serialize(&self) -> Vec<u8> {
        self.value.to_be_bytes().to_vec()
    }
}

/// A fixed-length-declared byte string (spec: maximum ≤ 128 bytes).
/// `max_len` is the schema column's declared width; `value` may be
/// shorter but is truncated to `max_len` bytes on serialization.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct StringField {
    value: String,
    max_len: u32,
}

impl StringField {
    pub fn new(value: String, max_len: u32) -> Self {
        StringField { value, max_len }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn max_len(&self) -> u32 {
        self.max_len
    }

    fn serialize(&self) -> Vec<u8> {
        let max_len = self.max_len as usize;
        let mut bytes = vec![0u8; 4 + max_len];
        let str_bytes = self.value.as_bytes();
        let copy_len = str_bytes.len().min(max_len);
        bytes[0..4].copy_from_slice(&(copy_len as u32).to_be_bytes());
        bytes[4..4 + copy_len].copy_from_slice(&str_bytes[..copy_len]);
        bytes
    }
}
