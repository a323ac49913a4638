use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::error::DbError;
use crate::heap_file::{DbFile, HeapFile};
use crate::tuple::TupleDesc;
use crate::types::{Type, MAX_STRING_LEN};

struct TableEntry {
    file: Arc<dyn DbFile>,
    name: String,
    primary_key: Option<String>,
}

/// Registry of tables, scoped to one [`crate::engine::Engine`]: id ↔ name
/// ↔ schema ↔ primary-key field ↔ backing file.
#[derive(Default)]
pub struct Catalog {
    by_name: RwLock<HashMap<String, Arc<TableEntry>>>,
    by_id: RwLock<HashMap<usize, Arc<TableEntry>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    pub fn add_table(&self, file: Arc<dyn DbFile>, name: String, primary_key: Option<String>) {
        let id = file.get_id();
        let entry = Arc::new(TableEntry {
            file,
            name: name.clone(),
            primary_key,
        });
        self.by_name.write().unwrap().insert(name, Arc::clone(&entry));
        self.by_id.write().unwrap().insert(id, entry);
    }

    pub fn get_table_from_name(&self, name: &str) -> Option<Arc<dyn DbFile>> {
        self.by_name
            .read()
            .unwrap()
            .get(name)
            .map(|e| Arc::clone(&e.file))
    }

    pub fn get_table_from_id(&self, id: usize) -> Option<Arc<dyn DbFile>> {
        self.by_id.read().unwrap().get(&id).map(|e| Arc::clone(&e.file))
    }

    pub fn get_table_name(&self, id: usize) -> Option<String> {
        self.by_id.read().unwrap().get(&id).map(|e| e.name.clone())
    }

    pub fn get_table_id(&self, name: &str) -> Option<usize> {
        self.by_name
            .read()
            .unwrap()
            .get(name)
            .map(|e| e.file.get_id())
    }

    pub fn primary_key_field(&self, id: usize) -> Option<String> {
        self.by_id
            .read()
            .unwrap()
            .get(&id)
            .and_then(|e| e.primary_key.clone())
    }

    pub fn get_tuple_desc(&self, table_id: usize) -> Option<TupleDesc> {
        self.get_table_from_id(table_id)
            .map(|t| t.get_tuple_desc().clone())
    }

    /// All table ids currently registered. Iteration order is not stable.
    pub fn table_ids(&self) -> Vec<usize> {
        self.by_id.read().unwrap().keys().copied().collect()
    }

    /// Loads a catalog file of the form
    /// `name ( col type [pk] , col type [pk] , ... )`, one table per line.
    /// `type` is `int` or `string` / `string(N)` (defaults to
    /// [`MAX_STRING_LEN`] when `N` is omitted). The backing file is
    /// `<data_dir>/<name>.dat`.
    pub fn load_schema_file(&self, schema_path: &Path, data_dir: &Path) -> Result<(), DbError> {
        let schema_file = File::open(schema_path)?;
        let reader = BufReader::new(schema_file);
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.load_schema_line(line, data_dir)?;
        }
        Ok(())
    }

    fn load_schema_line(&self, line: &str, data_dir: &Path) -> Result<(), DbError> {
        let open_paren = line
            .find('(')
            .ok_or_else(|| DbError::InvalidSchema(format!("missing '(' in line: {}", line)))?;
        let close_paren = line
            .rfind(')')
            .ok_or_else(|| DbError::InvalidSchema(format!("missing ')' in line: {}", line)))?;
        let table_name = line[..open_paren].trim().to_string();
        let body = &line[open_paren + 1..close_paren];

        let mut types = vec![];
        let mut names = vec![];
        let mut primary_key = None;

        for col in body.split(',') {
            let tokens: Vec<&str> = col.split_whitespace().collect();
            if tokens.len() < 2 {
                return Err(DbError::InvalidSchema(format!(
                    "malformed column definition: {}",
                    col
                )));
            }
            let col_name = tokens[0].to_string();
            let (type_name, declared_len) = parse_type_token(tokens[1])?;
            let ty = match type_name.as_str() {
                "int" => Type::Int,
                "string" => Type::Str(declared_len.unwrap_or(MAX_STRING_LEN as u32)),
                other => {
                    return Err(DbError::InvalidSchema(format!(
                        "unknown column type: {}",
                        other
                    )))
                }
            };
            if tokens.get(2).map(|t| t.eq_ignore_ascii_case("pk")).unwrap_or(false) {
                primary_key = Some(col_name.clone());
            }
            types.push(ty);
            names.push(Some(col_name));
        }

        let td = TupleDesc::new(types, names)?;
        let path = data_dir.join(format!("{}.dat", table_name));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        let heap_file = HeapFile::new(file, td);
        self.add_table(Arc::new(heap_file), table_name, primary_key);
        Ok(())
    }
}

fn parse_type_token(token: &str) -> Result<(String, Option<u32>), DbError> {
    if let Some(open) = token.find('(') {
        let close = token
            .find(')')
            .ok_or_else(|| DbError::InvalidSchema(format!("malformed type: {}", token)))?;
        let name = token[..open].to_lowercase();
        let len: u32 = token[open + 1..close]
            .parse()
            .map_err(|_| DbError::InvalidSchema(format!("malformed type length: {}", token)))?;
        Ok((name, Some(len)))
    } else {
        Ok((token.to_lowercase(), None))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_schema_with_primary_key_and_string_length() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("schemas.txt");
        let mut f = File::create(&schema_path).unwrap();
        writeln!(f, "employees (id int pk, name string(32))").unwrap();
        drop(f);

        let catalog = Catalog::new();
        catalog.load_schema_file(&schema_path, dir.path()).unwrap();

        let id = catalog.get_table_id("employees").unwrap();
        assert_eq!(catalog.primary_key_field(id), Some("id".to_string()));
        let td = catalog.get_tuple_desc(id).unwrap();
        assert_eq!(td.field_type(1), Some(&Type::Str(32)));
    }
}
