use std::collections::HashMap;

use crate::error::DbError;
use crate::fields::FieldVal;
use crate::operators::OpIterator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::Type;

/// A grouping key: either one field's value or the single global group
/// (when the operator is ungrouped).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Global,
    Int(i32),
    Str(String),
}

impl GroupKey {
    fn from_field(field: &FieldVal) -> Self {
        match field {
            FieldVal::Int(f) => GroupKey::Int(f.value()),
            FieldVal::Str(f) => GroupKey::Str(f.value().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

enum State {
    Int { min: i32, max: i32, sum: i64, count: i64 },
    Count { count: i64 },
}

/// Buffers and groups its child's output, emitting one tuple per group
/// once opened. Grouped output is `(groupValue, aggValue)`; ungrouped
/// output is `(aggValue,)`.
pub struct Aggregate<'a> {
    child: Box<dyn OpIterator + 'a>,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggOp,
    td: TupleDesc,
    results: Option<std::vec::IntoIter<Tuple>>,
    opened: bool,
}

impl<'a> Aggregate<'a> {
    pub fn new(
        child: Box<dyn OpIterator + 'a>,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggOp,
    ) -> Result<Self, DbError> {
        let child_td = child.tuple_desc();
        let agg_type = *child_td
            .field_type(agg_field)
            .ok_or(DbError::FieldNotFound(agg_field.to_string()))?;
        if op != AggOp::Count && matches!(agg_type, Type::Str(_)) {
            return Err(DbError::SchemaMismatch(
                "only COUNT is supported over STRING fields".to_string(),
            ));
        }

        let td = match group_field {
            Some(gf) => {
                let group_type = *child_td
                    .field_type(gf)
                    .ok_or(DbError::FieldNotFound(gf.to_string()))?;
                TupleDesc::new(
                    vec![group_type, Type::Int],
                    vec![Some("group".to_string()), Some("aggregate".to_string())],
                )?
            }
            None => TupleDesc::new(vec![Type::Int], vec![Some("aggregate".to_string())])?,
        };

        Ok(Aggregate {
            child,
            agg_field,
            group_field,
            op,
            td,
            results: None,
            opened: false,
        })
    }

    fn compute(&mut self) -> Result<Vec<Tuple>, DbError> {
        let mut groups: HashMap<GroupKey, (State, Option<FieldVal>)> = HashMap::new();
        let mut order: Vec<GroupKey> = Vec::new();

        self.child.open()?;
        while let Some(t) = self.child.next()? {
            let key = match self.group_field {
                Some(gf) => GroupKey::from_field(
                    t.get_field(gf).ok_or(DbError::FieldNotFound(gf.to_string()))?,
                ),
                None => GroupKey::Global,
            };
            let agg_field = t
                .get_field(self.agg_field)
                .ok_or(DbError::FieldNotFound(self.agg_field.to_string()))?
                .clone();
            let group_value = self.group_field.and_then(|gf| t.get_field(gf).cloned());

            if !groups.contains_key(&key) {
                order.push(key.clone());
                let init = match (&agg_field, self.op) {
                    (FieldVal::Int(f), _) => State::Int {
                        min: f.value(),
                        max: f.value(),
                        sum: 0,
                        count: 0,
                    },
                    _ => State::Count { count: 0 },
                };
                groups.insert(key.clone(), (init, group_value));
            }
            let (state, _) = groups.get_mut(&key).unwrap();
            match state {
                State::Int { min, max, sum, count } => {
                    let v = agg_field.clone().into_int().unwrap().value();
                    *min = (*min).min(v);
                    *max = (*max).max(v);
                    *sum += v as i64;
                    *count += 1;
                }
                State::Count { count } => {
                    *count += 1;
                }
            }
        }
        self.child.close();

        let mut out = Vec::with_capacity(order.len());
        for key in order {
            let (state, group_value) = groups.remove(&key).unwrap();
            let agg_value = match state {
                State::Int { min, max, sum, count } => match self.op {
                    AggOp::Min => min,
                    AggOp::Max => max,
                    AggOp::Sum => sum as i32,
                    AggOp::Avg => (sum / count.max(1)) as i32,
                    AggOp::Count => count as i32,
                },
                State::Count { count } => count as i32,
            };
            let mut fields = Vec::with_capacity(2);
            if let Some(gv) = group_value {
                fields.push(gv);
            }
            fields.push(FieldVal::Int(crate::fields::IntField::new(agg_value)));
            out.push(Tuple::new(fields, self.td.clone()));
        }
        Ok(out)
    }
}

impl<'a> OpIterator for Aggregate<'a> {
    fn open(&mut self) -> Result<(), DbError> {
        let results = self.compute()?;
        self.results = Some(results.into_iter());
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.results = None;
        self.opened = false;
    }

    fn rewind(&mut self) -> Result<(), DbError> {
        self.open()
    }

    fn next(&mut self) -> Result<Option<Tuple>, DbError> {
        if !self.opened {
            return Err(DbError::NotOpen);
        }
        Ok(self.results.as_mut().and_then(|it| it.next()))
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}
