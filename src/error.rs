use thiserror::Error;

use crate::transaction::TransactionId;

/// Errors surfaced by the storage and execution engine.
///
/// [`DbError::TransactionAborted`] is the only transient, transaction-scoped
/// variant: callers should close their operator tree and retry the
/// transaction. Every other variant is an unrecoverable data or invariant
/// error that aborts the query.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page full")]
    PageFull,

    #[error("tuple not present")]
    TupleNotPresent,

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("no such element")]
    NoSuchElement,

    #[error("operator not open")]
    NotOpen,

    #[error("transaction {tid:?} aborted")]
    TransactionAborted { tid: TransactionId },

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("all resident pages are dirty, cannot evict under NO STEAL")]
    AllPagesDirty,

    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("page {page_no} out of range (file has {num_pages} pages)")]
    PageOutOfRange { page_no: usize, num_pages: usize },
}
