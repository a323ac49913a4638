use crate::error::DbError;
use crate::operators::OpIterator;
use crate::predicate::JoinPredicate;
use crate::tuple::{Tuple, TupleDesc};

/// Nested-loop join: for each left tuple, rescans the right child end to
/// end looking for matches. No join-order enumeration or alternate join
/// algorithms are attempted; the operator tree is built by the caller,
/// not chosen by this crate.
pub struct Join<'a> {
    left: Box<dyn OpIterator + 'a>,
    right: Box<dyn OpIterator + 'a>,
    predicate: JoinPredicate,
    td: TupleDesc,
    current_left: Option<Tuple>,
    opened: bool,
}

impl<'a> Join<'a> {
    pub fn new(
        predicate: JoinPredicate,
        left: Box<dyn OpIterator + 'a>,
        right: Box<dyn OpIterator + 'a>,
    ) -> Self {
        let td = TupleDesc::merge(left.tuple_desc(), right.tuple_desc());
        Join {
            left,
            right,
            predicate,
            td,
            current_left: None,
            opened: false,
        }
    }
}

impl<'a> OpIterator for Join<'a> {
    fn open(&mut self) -> Result<(), DbError> {
        self.left.open()?;
        self.right.open()?;
        self.current_left = self.left.next()?;
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.current_left = None;
        self.opened = false;
    }

    fn rewind(&mut self) -> Result<(), DbError> {
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = self.left.next()?;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>, DbError> {
        if !self.opened {
            return Err(DbError::NotOpen);
        }
        loop {
            let left_tuple = match &self.current_left {
                Some(t) => t.clone(),
                None => return Ok(None),
            };
            while let Some(right_tuple) = self.right.next()? {
                if self.predicate.filter(&left_tuple, &right_tuple)? {
                    let mut fields = left_tuple.fields().to_vec();
                    fields.extend(right_tuple.fields().to_vec());
                    return Ok(Some(Tuple::new(fields, self.td.clone())));
                }
            }
            self.right.rewind()?;
            self.current_left = self.left.next()?;
        }
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}
