use crate::buffer_pool::BufferPool;
use crate::error::DbError;
use crate::fields::{FieldVal, IntField};
use crate::operators::OpIterator;
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::Type;

/// Drains its child, deleting every tuple (by its `RecordId`) from
/// whichever table it belongs to, then yields a single tuple holding the
/// count of rows deleted.
pub struct Delete<'a> {
    child: Box<dyn OpIterator + 'a>,
    bp: &'a BufferPool,
    tid: TransactionId,
    td: TupleDesc,
    done: bool,
    opened: bool,
}

impl<'a> Delete<'a> {
    pub fn new(bp: &'a BufferPool, tid: TransactionId, child: Box<dyn OpIterator + 'a>) -> Self {
        let td = TupleDesc::new(vec![Type::Int], vec![Some("count".to_string())]).unwrap();
        Delete {
            child,
            bp,
            tid,
            td,
            done: false,
            opened: false,
        }
    }
}

impl<'a> OpIterator for Delete<'a> {
    fn open(&mut self) -> Result<(), DbError> {
        self.child.open()?;
        self.done = false;
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.opened = false;
    }

    fn rewind(&mut self) -> Result<(), DbError> {
        self.child.rewind()?;
        self.done = false;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>, DbError> {
        if !self.opened {
            return Err(DbError::NotOpen);
        }
        if self.done {
            return Ok(None);
        }
        let mut count = 0i32;
        while let Some(t) = self.child.next()? {
            self.bp.delete_tuple(self.tid, &t)?;
            count += 1;
        }
        self.done = true;
        Ok(Some(Tuple::new(vec![FieldVal::Int(IntField::new(count))], self.td.clone())))
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}
