use crate::error::DbError;
use crate::operators::OpIterator;
use crate::tuple::{Tuple, TupleDesc};

/// Re-projects each child tuple onto a narrower schema containing only
/// the named fields, in the order requested.
pub struct Project<'a> {
    child: Box<dyn OpIterator + 'a>,
    field_indices: Vec<usize>,
    td: TupleDesc,
    opened: bool,
}

impl<'a> Project<'a> {
    pub fn new(field_names: &[&str], child: Box<dyn OpIterator + 'a>) -> Result<Self, DbError> {
        let child_td = child.tuple_desc();
        let mut field_indices = Vec::with_capacity(field_names.len());
        let mut types = Vec::with_capacity(field_names.len());
        let mut names = Vec::with_capacity(field_names.len());
        for name in field_names {
            let idx = child_td
                .field_name_to_index(name)
                .ok_or_else(|| DbError::FieldNotFound((*name).to_string()))?;
            field_indices.push(idx);
            types.push(*child_td.field_type(idx).unwrap());
            names.push(child_td.field_name(idx).map(|n| n.to_string()));
        }
        let td = TupleDesc::new(types, names)?;
        Ok(Project {
            child,
            field_indices,
            td,
            opened: false,
        })
    }
}

impl<'a> OpIterator for Project<'a> {
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
        match self.child.next()? {
            Some(t) => {
                let fields = self
                    .field_indices
                    .iter()
                    .map(|&i| t.get_field(i).unwrap().clone())
                    .collect();
                Ok(Some(Tuple::new(fields, self.td.clone())))
            }
            None => Ok(None),
        }
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}
