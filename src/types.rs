use crate::error::DbError;
use crate::fields::{FieldVal, IntField, StringField};

/// Maximum declared length, in bytes, of a `Str` field (spec: "≤ 128 bytes").
pub const MAX_STRING_LEN: usize = 128;

/// The closed set of column types a [`crate::tuple::TupleDesc`] may hold.
///
/// `Str(n)` carries its own declared maximum length so that a schema can mix
/// columns of different widths, unlike a single process-wide string size.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Type {
    Int,
    Str(u32),
}

impl Type {
    /// On-wire width in bytes of a field of this type.
    pub fn len(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::Str(max_len) => 4 + *max_len as usize,
        }
    }

    /// Produces this type's empty/default value.
    pub fn empty_value(&self) -> FieldVal {
        match self {
            Type::Int => FieldVal::Int(IntField::new(0)),
            Type::Str(max_len) => FieldVal::Str(StringField::new(String::new(), *max_len)),
        }
    }

    /// Parses one field of this type from the front of `bytes`.
    pub fn parse(&self, bytes: &[u8]) -> Result<FieldVal, DbError> {
        match self {
            Type::Int => {
                if bytes.len() < 4 {
                    return Err(DbError::SchemaMismatch(
                        "not enough bytes for int field".into(),
                    ));
                }
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&bytes[..4]);
                Ok(FieldVal::Int(IntField::new(i32::from_be_bytes(buf))))
            }
            Type::Str(max_len) => {
                let max_len = *max_len as usize;
                if bytes.len() < 4 + max_len {
                    return Err(DbError::SchemaMismatch(
                        "not enough bytes for string field".into(),
                    ));
                }
                let mut len_buf = [0u8; 4];
                len_buf.copy_from_slice(&bytes[..4]);
                let len = u32::from_be_bytes(len_buf) as usize;
                let len = len.min(max_len);
                let content = &bytes[4..4 + len];
                let value = String::from_utf8_lossy(content).into_owned();
                Ok(FieldVal::Str(StringField::new(value, max_len as u32)))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn int_round_trips() {
        let f = FieldVal::Int(IntField::new(-7));
        let bytes = f.serialize();
        let parsed = Type::Int.parse(&bytes).unwrap();
        assert_eq!(f, parsed);
    }

    #[test]
    fn string_round_trips_with_padding() {
        let f = FieldVal::Str(StringField::new("hi".to_string(), 16));
        let bytes = f.serialize();
        assert_eq!(bytes.len(), Type::Str(16).len());
        let parsed = Type::Str(16).parse(&bytes).unwrap();
        assert_eq!(f, parsed);
    }
}
