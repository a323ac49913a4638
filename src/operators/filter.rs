use crate::error::DbError;
use crate::operators::OpIterator;
use crate::predicate::Predicate;
use crate::tuple::{Tuple, TupleDesc};

/// Emits only the child tuples matching `predicate`.
pub struct Filter<'a> {
    child: Box<dyn OpIterator + 'a>,
    predicate: Predicate,
    opened: bool,
}

impl<'a> Filter<'a> {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator + 'a>) -> Self {
        Filter {
            child,
            predicate,
            opened: false,
        }
    }
}

impl<'a> OpIterator for Filter<'a> {
    fn open(&mut self) -> Result<(), DbError> {
        self.child.open()?;
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.opened = false;
    }

    fn rewind(&mut self) -> Result<(), DbError> {
        self.child.rewind()
    }

    fn next(&mut self) -> Result<Option<Tuple>, DbError> {
        if !self.opened {
            return Err(DbError::NotOpen);
        }
        while let Some(t) = self.child.next()? {
            if self.predicate.filter(&t)? {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }

    fn tuple_desc(&self) -> &TupleDesc {
        self.child.tuple_desc()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fields::{FieldVal, IntField};
    use crate::predicate::Op;
    use crate::tuple::TupleDesc;
    use crate::types::Type;

    struct VecScan {
        tuples: Vec<Tuple>,
        index: usize,
        td: TupleDesc,
        opened: bool,
    }

    impl OpIterator for VecScan {
        fn open(&mut self) -> Result<(), DbError> {
            self.opened = true;
            self.index = 0;
            Ok(())
        }
        fn close(&mut self) {
            self.opened = false;
        }
        fn rewind(&mut self) -> Result<(), DbError> {
            self.open()
        }
        fn next(&mut self) -> Result<Option<Tuple>, DbError> {
            if !self.opened {
                return Err(DbError::NotOpen);
            }
            if self.index < self.tuples.len() {
                let t = self.tuples[self.index].clone();
                self.index += 1;
                Ok(Some(t))
            } else {
                Ok(None)
            }
        }
        fn tuple_desc(&self) -> &TupleDesc {
            &self.td
        }
    }

    #[test]
    fn keeps_only_matching_tuples() {
        let td = TupleDesc::new(vec![Type::Int], vec![Some("a".to_string())]).unwrap();
        let tuples = (0..5)
            .map(|i| Tuple::new(vec![FieldVal::Int(IntField::new(i))], td.clone()))
            .collect();
        let child = VecScan {
            tuples,
            index: 0,
            td: td.clone(),
            opened: false,
        };
        let pred = Predicate::new(0, Op::GreaterThan, FieldVal::Int(IntField::new(2)));
        let mut filter = Filter::new(pred, Box::new(child));
        filter.open().unwrap();
        let mut values = vec![];
        while let Some(t) = filter.next().unwrap() {
            values.push(t.get_field(0).unwrap().clone().into_int().unwrap().value());
        }
        assert_eq!(values, vec![3, 4]);
    }
}
