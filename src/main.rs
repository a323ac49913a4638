use std::path::PathBuf;

use rowdb::buffer_pool::EvictionPolicy;
use rowdb::engine::Engine;
use rowdb::error::DbError;
use rowdb::fields::{FieldVal, IntField, StringField};
use rowdb::operators::insert::Insert;
use rowdb::operators::seq_scan::SeqScan;
use rowdb::operators::OpIterator;
use rowdb::transaction::TransactionId;
use rowdb::tuple::Tuple;

fn main() -> Result<(), DbError> {
    env_logger::init();

    let engine = Engine::new(50, EvictionPolicy::Steal);

    let mut schema_path = std::env::current_dir()?;
    schema_path.push("schemas.txt");
    let data_dir: PathBuf = std::env::current_dir()?;

    if !schema_path.exists() {
        log::warn!("no schemas.txt in {:?}; nothing to load", data_dir);
        return Ok(());
    }

    engine.load_schema_file(&schema_path, &data_dir)?;

    let table_name = "employees";
    let table_id = match engine.catalog().get_table_id(table_name) {
        Some(id) => id,
        None => {
            log::warn!("table {:?} not present in schemas.txt", table_name);
            return Ok(());
        }
    };
    let td = engine.catalog().get_tuple_desc(table_id).unwrap();

    let tid = TransactionId::new();
    let rows: Vec<Tuple> = (0..3)
        .map(|i| {
            Tuple::new(
                vec![
                    FieldVal::Int(IntField::new(i)),
                    FieldVal::Str(StringField::new(format!("Alice_{}", i), 32)),
                ],
                td.clone(),
            )
        })
        .collect();

    struct RowSource {
        rows: Vec<Tuple>,
        index: usize,
        td: rowdb::tuple::TupleDesc,
        opened: bool,
    }
    impl OpIterator for RowSource {
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
            if self.index < self.rows.len() {
                let t = self.rows[self.index].clone();
                self.index += 1;
                Ok(Some(t))
            } else {
                Ok(None)
            }
        }
        fn tuple_desc(&self) -> &rowdb::tuple::TupleDesc {
            &self.td
        }
    }
    let source = RowSource {
        rows,
        index: 0,
        td: td.clone(),
        opened: false,
    };

    let mut insert = Insert::new(engine.buffer_pool(), table_id, tid, Box::new(source));
    insert.open()?;
    if let Some(count) = insert.next()? {
        log::info!("inserted {} rows", count.get_field(0).unwrap());
    }
    insert.close();
    engine.buffer_pool().commit_transaction(tid)?;

    let scan_tid = TransactionId::new();
    let table = engine.catalog().get_table_from_id(table_id).unwrap();
    let mut scan = SeqScan::new(engine.buffer_pool(), table, "e", scan_tid);
    scan.open()?;
    let mut tuple_count = 0;
    while let Some(t) = scan.next()? {
        println!("{}", t);
        tuple_count += 1;
    }
    scan.close();
    engine.buffer_pool().commit_transaction(scan_tid)?;

    println!("tuple count: {}", tuple_count);
    Ok(())
}
