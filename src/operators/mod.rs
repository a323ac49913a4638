//! Pull-based (volcano-model) query operators: each implements
//! [`OpIterator`] and pulls its input, one tuple at a time, from its
//! children.

pub mod aggregate;
pub mod delete;
pub mod filter;
pub mod insert;
pub mod join;
pub mod order_by;
pub mod project;
pub mod seq_scan;

use crate::error::DbError;
use crate::tuple::{Tuple, TupleDesc};

/// Common interface every operator in the tree implements.
///
/// `next()` returns `Ok(None)` once exhausted rather than a separate
/// `hasNext`/`next` pair. An operator must be `open`ed before `next` or
/// `rewind` are called, and `close`d (releasing whatever it holds open)
/// when the caller is done with it or on error.
pub trait OpIterator {
    fn open(&mut self) -> Result<(), DbError>;
    fn close(&mut self);
    fn rewind(&mut self) -> Result<(), DbError>;
    fn next(&mut self) -> Result<Option<Tuple>, DbError>;
    fn tuple_desc(&self) -> &TupleDesc;
}
