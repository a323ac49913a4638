use std::fmt::{self, Display, Formatter};

use crate::error::DbError;
use crate::fields::FieldVal;
use crate::heap_page::HeapPageId;
use crate::types::Type;

/// Identity of a tuple as (page, slot).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct RecordId {
    pid: HeapPageId,
    tuple_no: usize,
}

impl RecordId {
    pub fn new(pid: HeapPageId, tuple_no: usize) -> Self {
        RecordId { pid, tuple_no }
    }

    pub fn page_id(&self) -> HeapPageId {
        self.pid
    }

    pub fn tuple_no(&self) -> usize {
        self.tuple_no
    }
}

/// Ordered schema: a non-empty sequence of (type, optional name).
///
/// Equality (`PartialEq`) compares types in order only; names are ignored.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    types: Vec<Type>,
    names: Vec<Option<String>>,
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
    }
}
impl Eq for TupleDesc {}

impl TupleDesc {
    pub fn new(types: Vec<Type>, names: Vec<Option<String>>) -> Result<Self, DbError> {
        if types.is_empty() {
            return Err(DbError::InvalidSchema(
                "a TupleDesc must have at least one field".to_string(),
            ));
        }
        if types.len() != names.len() {
            return Err(DbError::InvalidSchema(
                "types and names must have the same length".to_string(),
            ));
        }
        Ok(TupleDesc { types, names })
    }

    /// Concatenates two schemas field-for-field, in order.
    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut types = a.types.clone();
        types.extend(b.types.clone());
        let mut names = a.names.clone();
        names.extend(b.names.clone());
        TupleDesc { types, names }
    }

    pub fn num_fields(&self) -> usize {
        self.types.len()
    }

    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.names.get(i).and_then(|n| n.as_deref())
    }

    /// Returns the index of the first field with the given name.
    pub fn field_name_to_index(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    pub fn field_type(&self, i: usize) -> Option<&Type> {
        self.types.get(i)
    }

    /// Total size, in bytes, of a tuple matching this schema.
    pub fn size(&self) -> usize {
        self.types.iter().map(|t| t.len()).sum()
    }

    /// Returns a copy of this schema with every name prefixed `"alias."`
    /// (used by `SeqScan`).
    pub fn with_alias_prefix(&self, alias: &str) -> TupleDesc {
        let names = self
            .names
            .iter()
            .map(|n| n.as_ref().map(|n| format!("{}.{}", alias, n)))
            .collect();
        TupleDesc {
            types: self.types.clone(),
            names,
        }
    }
}

/// A row: a schema reference, a vector of fields, and an optional record
/// identity.
#[derive(Debug, Clone)]
pub struct Tuple {
    fields: Vec<FieldVal>,
    td: TupleDesc,
    rid: Option<RecordId>,
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.td == other.td && self.fields == other.fields
    }
}
impl Eq for Tuple {}

impl Display for Tuple {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            let name = self.td.field_name(i).unwrap_or("?");
            s.push_str(&format!("{}: {}", name, field));
            if i != self.fields.len() - 1 {
                s.push_str(", ");
            }
        }
        write!(f, "{{{}}}", s)
    }
}

impl Tuple {
    /// Builds a tuple. Field types must match `td` in order; a mismatch is
    /// a schema error rather than a panic.
    pub fn new(fields: Vec<FieldVal>, td: TupleDesc) -> Self {
        Tuple {
            fields,
            td,
            rid: None,
        }
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.td
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.rid
    }

    pub fn set_record_id(&mut self, rid: RecordId) {
        self.rid = Some(rid);
    }

    pub fn get_field(&self, i: usize) -> Option<&FieldVal> {
        self.fields.get(i)
    }

    /// Overwrites field `i`. Requires the new field's type to match the
    /// schema's declared type for that position.
    pub fn set_field(&mut self, i: usize, field: FieldVal) -> Result<(), DbError> {
        let expected = self
            .td
            .field_type(i)
            .ok_or(DbError::FieldNotFound(i.to_string()))?;
        if *expected != field.get_type() {
            return Err(DbError::SchemaMismatch(format!(
                "field {} expects {:?}, got {:?}",
                i,
                expected,
                field.get_type()
            )));
        }
        self.fields[i] = field;
        Ok(())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![];
        for field in self.fields.iter() {
            bytes.extend(field.serialize());
        }
        bytes
    }

    pub fn deserialize(bytes: &[u8], td: &TupleDesc) -> Result<Self, DbError> {
        let mut offset = 0;
        let mut fields = vec![];
        for t in td.types.iter() {
            let field = t.parse(&bytes[offset..])?;
            offset += t.len();
            fields.push(field);
        }
        Ok(Tuple::new(fields, td.clone()))
    }

    pub fn fields(&self) -> &[FieldVal] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{IntField, StringField};

    fn td() -> TupleDesc {
        TupleDesc::new(
            vec![Type::Int, Type::Str(8)],
            vec![Some("int".to_string()), Some("string".to_string())],
        )
        .unwrap()
    }

    #[test]
    fn merge_concatenates_fields_in_order() {
        let td1 = td();
        let td2 = td();
        let merged = TupleDesc::merge(&td1, &td2);
        assert_eq!(merged.num_fields(), 4);
        assert_eq!(merged.field_name(0), Some("int"));
        assert_eq!(merged.field_name(2), Some("int"));
    }

    #[test]
    fn equality_ignores_names_and_record_id() {
        let td_a = TupleDesc::new(vec![Type::Int], vec![Some("a".to_string())]).unwrap();
        let td_b = TupleDesc::new(vec![Type::Int], vec![Some("b".to_string())]).unwrap();
        let mut t1 = Tuple::new(vec![FieldVal::Int(IntField::new(1))], td_a);
        let t2 = Tuple::new(vec![FieldVal::Int(IntField::new(1))], td_b);
        t1.set_record_id(RecordId::new(HeapPageId::new(1, 0), 3));
        assert_eq!(t1, t2);
    }

    #[test]
    fn set_field_rejects_type_mismatch() {
        let mut t = Tuple::new(vec![FieldVal::Int(IntField::new(1))], {
            TupleDesc::new(vec![Type::Int], vec![None]).unwrap()
        });
        let bad = FieldVal::Str(StringField::new("x".to_string(), 4));
        assert!(t.set_field(0, bad).is_err());
    }

    #[test]
    fn test_tuple_serialize_deserialize() {
        let schema = td();
        let tuple = Tuple::new(
            vec![
                FieldVal::Int(IntField::new(1)),
                FieldVal::Str(StringField::new("hello".to_string(), 8)),
            ],
            schema.clone(),
        );
        let bytes = tuple.serialize();
        let tuple2 = Tuple::deserialize(&bytes, &schema).unwrap();
        assert_eq!(tuple, tuple2);
    }
}
