use crate::error::DbError;
use crate::operators::OpIterator;
use crate::tuple::{Tuple, TupleDesc};

/// Buffers all child output, sorts by one field using its total order,
/// and emits in sorted order. Ties preserve input order (stable sort).
pub struct OrderBy<'a> {
    child: Box<dyn OpIterator + 'a>,
    field_index: usize,
    ascending: bool,
    td: TupleDesc,
    buffered: Option<std::vec::IntoIter<Tuple>>,
    opened: bool,
}

impl<'a> OrderBy<'a> {
    pub fn new(field_index: usize, ascending: bool, child: Box<dyn OpIterator + 'a>) -> Self {
        let td = child.tuple_desc().clone();
        OrderBy {
            child,
            field_index,
            ascending,
            td,
            buffered: None,
            opened: false,
        }
    }

    fn load(&mut self) -> Result<(), DbError> {
        self.child.open()?;
        let mut rows = Vec::new();
        while let Some(t) = self.child.next()? {
            rows.push(t);
        }
        self.child.close();

        let mut err = None;
        rows.sort_by(|a, b| {
            let fields = a
                .get_field(self.field_index)
                .zip(b.get_field(self.field_index))
                .ok_or_else(|| DbError::FieldNotFound(self.field_index.to_string()));
            let ord = fields.and_then(|(af, bf)| af.cmp(bf));
            match ord {
                Ok(ord) => {
                    if self.ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                }
                Err(e) => {
                    err = Some(e);
                    std::cmp::Ordering::Equal
                }
            }
        });
        if let Some(e) = err {
            return Err(e);
        }
        self.buffered = Some(rows.into_iter());
        Ok(())
    }
}

impl<'a> OpIterator for OrderBy<'a> {
    fn open(&mut self) -> Result<(), DbError> {
        self.load()?;
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.buffered = None;
        self.opened = false;
    }

    fn rewind(&mut self) -> Result<(), DbError> {
        self.open()
    }

    fn next(&mut self) -> Result<Option<Tuple>, DbError> {
        if !self.opened {
            return Err(DbError::NotOpen);
        }
        Ok(self.buffered.as_mut().and_then(|it| it.next()))
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fields::{FieldVal, IntField};
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
    fn sorts_ascending_by_field() {
        let td = TupleDesc::new(vec![Type::Int], vec![Some("a".to_string())]).unwrap();
        let tuples = [3, 1, 2]
            .iter()
            .map(|v| Tuple::new(vec![FieldVal::Int(IntField::new(*v))], td.clone()))
            .collect();
        let child = VecScan {
            tuples,
            index: 0,
            td,
            opened: false,
        };
        let mut ob = OrderBy::new(0, true, Box::new(child));
        ob.open().unwrap();
        let mut values = vec![];
        while let Some(t) = ob.next().unwrap() {
            values.push(t.get_field(0).unwrap().clone().into_int().unwrap().value());
        }
        assert_eq!(values, vec![1, 2, 3]);
    }
}
