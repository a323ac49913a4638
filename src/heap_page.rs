use crate::config;
use crate::error::DbError;
use crate::transaction::TransactionId;
use crate::tuple::{RecordId, Tuple, TupleDesc};

#[derive(Debug, PartialEq, Eq, Clone, Hash, Copy)]
pub enum Permission {
    Read,
    Write,
}

/// Identifies a page within a table: (table id, page number).
#[derive(Debug, PartialEq, Eq, Clone, Hash, Copy)]
pub struct HeapPageId {
    table_id: usize,
    page_number: usize,
}

impl HeapPageId {
    pub fn new(table_id: usize, page_number: usize) -> Self {
        HeapPageId {
            table_id,
            page_number,
        }
    }

    pub fn table_id(&self) -> usize {
        self.table_id
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Two-integer form used for hashing and comparison.
    pub fn serialize(&self) -> (usize, usize) {
        (self.table_id, self.page_number)
    }
}

/// A fixed-size block of bytes read from or written to a [`crate::heap_file::HeapFile`].
///
/// Layout: header bitmap (`ceil(num_slots / 8)` bytes, bit *i* set iff slot
/// *i* is occupied), then `num_slots` fixed-width tuple slots, then zero
/// padding to `page_size`.
#[derive(Debug, Clone)]
pub struct HeapPage {
    pid: HeapPageId,
    td: TupleDesc,
    page_size: usize,
    header: Vec<u8>,
    tuples: Vec<Tuple>,
    num_slots: usize,
    before_image: Vec<u8>,
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    /// Computes the number of fixed-size slots a page of `page_size` bytes
    /// has room for, given a schema whose tuples are `tuple_bits` bits wide.
    fn num_slots_for(page_size: usize, td: &TupleDesc) -> usize {
        let tuple_bits = td.size() * 8;
        (page_size * 8) / (tuple_bits + 1)
    }

    fn header_size(num_slots: usize) -> usize {
        (num_slots + 7) / 8
    }

    /// Parses a raw page image. `data.len()` must equal the configured page
    /// size.
    pub fn new(pid: HeapPageId, data: Vec<u8>, td: TupleDesc) -> Result<Self, DbError> {
        let page_size = config::page_size();
        if data.len() != page_size {
            return Err(DbError::SchemaMismatch(format!(
                "page data is {} bytes, expected {}",
                data.len(),
                page_size
            )));
        }
        let num_slots = Self::num_slots_for(page_size, &td);
        let header_size = Self::header_size(num_slots);
        let header = data[..header_size].to_vec();

        let mut tuples = Vec::with_capacity(num_slots);
        for i in 0..num_slots {
            if Self::get_slot(&header, i) {
                let start = header_size + i * td.size();
                let end = start + td.size();
                let mut tuple = Tuple::deserialize(&data[start..end], &td)?;
                tuple.set_record_id(RecordId::new(pid, i));
                tuples.push(tuple);
            } else {
                tuples.push(Tuple::new(vec![], td.clone()));
            }
        }

        Ok(HeapPage {
            pid,
            td,
            page_size,
            header,
            tuples,
            num_slots,
            before_image: data,
            dirtied_by: None,
        })
    }

    pub fn id(&self) -> HeapPageId {
        self.pid
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.td
    }

    /// The page's contents as of the last [`HeapPage::set_before_image`]
    /// call, used by [`crate::buffer_pool::BufferPool::abort_transaction`]
    /// to revert an aborted write.
    pub fn get_before_image(&self) -> Result<HeapPage, DbError> {
        HeapPage::new(self.pid, self.before_image.clone(), self.td.clone())
    }

    pub fn set_before_image(&mut self) {
        self.before_image = self.get_page_data();
    }

    /// Re-encodes the page to its byte representation. Vacated slots are
    /// zeroed.
    pub fn get_page_data(&self) -> Vec<u8> {
        let mut data = self.header.clone();
        for i in 0..self.num_slots {
            if Self::get_slot(&self.header, i) {
                data.extend(self.tuples[i].serialize());
            } else {
                data.extend(vec![0; self.td.size()]);
            }
        }
        data.extend(vec![0u8; self.page_size - data.len()]);
        data
    }

    fn get_slot(header: &[u8], i: usize) -> bool {
        let idx = i / 8;
        let bit = i % 8;
        if idx >= header.len() {
            return false;
        }
        header[idx] & (1 << bit) != 0
    }

    fn set_slot(header: &mut [u8], i: usize, value: bool) {
        let idx = i / 8;
        let bit = i % 8;
        if value {
            header[idx] |= 1 << bit;
        } else {
            header[idx] &= !(1 << bit);
        }
    }

    /// Inserts `t` into the lowest-indexed empty slot, assigning its
    /// `RecordId`. Fails if the page is full or the tuple's schema doesn't
    /// match the page's.
    pub fn insert_tuple(&mut self, mut t: Tuple) -> Result<(), DbError> {
        if *t.tuple_desc() != self.td {
            return Err(DbError::SchemaMismatch(
                "tuple schema does not match page schema".to_string(),
            ));
        }
        for i in 0..self.num_slots {
            if !Self::get_slot(&self.header, i) {
                t.set_record_id(RecordId::new(self.pid, i));
                self.tuples[i] = t;
                Self::set_slot(&mut self.header, i, true);
                return Ok(());
            }
        }
        Err(DbError::PageFull)
    }

    /// Clears the slot named by `t.record_id()`. Does not zero the slot's
    /// bytes in memory; they are zeroed on the next
    /// [`HeapPage::get_page_data`] call regardless.
    pub fn delete_tuple(&mut self, t: &Tuple) -> Result<(), DbError> {
        let rid = t.record_id().ok_or(DbError::TupleNotPresent)?;
        if rid.page_id() != self.pid {
            return Err(DbError::TupleNotPresent);
        }
        let slot = rid.tuple_no();
        if slot >= self.num_slots || !Self::get_slot(&self.header, slot) {
            return Err(DbError::TupleNotPresent);
        }
        self.tuples[slot] = Tuple::new(vec![], self.td.clone());
        Self::set_slot(&mut self.header, slot, false);
        Ok(())
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn num_empty_slots(&self) -> usize {
        (0..self.num_slots)
            .filter(|&i| !Self::get_slot(&self.header, i))
            .count()
    }

    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        self.dirtied_by = if dirty { Some(tid) } else { None };
    }

    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    pub fn iter(&self) -> HeapPageIterator<'_> {
        HeapPageIterator {
            page: self,
            index: 0,
        }
    }
}

/// Yields occupied-slot tuples in ascending slot order.
pub struct HeapPageIterator<'a> {
    page: &'a HeapPage,
    index: usize,
}

impl<'a> Iterator for HeapPageIterator<'a> {
    type Item = &'a Tuple;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.page.num_slots {
            let i = self.index;
            self.index += 1;
            if HeapPage::get_slot(&self.page.header, i) {
                return Some(&self.page.tuples[i]);
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fields::{FieldVal, IntField};
    use crate::types::Type;

    fn schema() -> TupleDesc {
        TupleDesc::new(vec![Type::Int], vec![Some("a".to_string())]).unwrap()
    }

    fn empty_page(pid: HeapPageId) -> HeapPage {
        let data = vec![0u8; config::page_size()];
        HeapPage::new(pid, data, schema()).unwrap()
    }

    #[test]
    fn round_trips_through_page_data() {
        let pid = HeapPageId::new(1, 0);
        let mut page = empty_page(pid);
        for i in 0..5 {
            let t = Tuple::new(vec![FieldVal::Int(IntField::new(i))], schema());
            page.insert_tuple(t).unwrap();
        }
        let bytes = page.get_page_data();
        let page2 = HeapPage::new(pid, bytes, schema()).unwrap();
        let values: Vec<i32> = page2
            .iter()
            .map(|t| t.get_field(0).unwrap().clone().into_int().unwrap().value())
            .collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn insert_assigns_record_id_and_fills_lowest_slot() {
        let pid = HeapPageId::new(2, 0);
        let mut page = empty_page(pid);
        let t = Tuple::new(vec![FieldVal::Int(IntField::new(42))], schema());
        page.insert_tuple(t).unwrap();
        let back = page.iter().next().unwrap();
        assert_eq!(back.record_id().unwrap().tuple_no(), 0);
    }

    #[test]
    fn page_full_when_no_empty_slots() {
        let pid = HeapPageId::new(3, 0);
        let mut page = empty_page(pid);
        let n = page.num_slots();
        for i in 0..n {
            page.insert_tuple(Tuple::new(vec![FieldVal::Int(IntField::new(i as i32))], schema()))
                .unwrap();
        }
        let err = page
            .insert_tuple(Tuple::new(vec![FieldVal::Int(IntField::new(999))], schema()))
            .unwrap_err();
        assert!(matches!(err, DbError::PageFull));
    }

    #[test]
    fn delete_then_reinsert_reuses_slot() {
        let pid = HeapPageId::new(4, 0);
        let mut page = empty_page(pid);
        let t = Tuple::new(vec![FieldVal::Int(IntField::new(1))], schema());
        page.insert_tuple(t).unwrap();
        let to_delete = page.iter().next().unwrap().clone();
        assert_eq!(page.num_empty_slots(), page.num_slots() - 1);
        page.delete_tuple(&to_delete).unwrap();
        assert_eq!(page.num_empty_slots(), page.num_slots());
        assert!(page.delete_tuple(&to_delete).is_err());
    }
}
