//! Ordered, id-unique list of records.
//!
//! A `Collection` is "the current known state" of a list view. Order is the
//! fetch/insertion order; lookups go through a side index keyed by id so the
//! uniqueness invariant holds for every mutating operation.

use std::collections::HashMap;

use log::warn;

use crate::error::QuoteError;
use crate::record::{Record, RecordId};

/// Ordered records with unique identifiers.
#[derive(Debug, Clone)]
pub struct Collection<R: Record> {
    records: Vec<R>,
    index: HashMap<RecordId, usize>,
}

impl<R: Record> Default for Collection<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<R: Record> Collection<R> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from fetched records.
    ///
    /// A repeated id keeps the position of its first occurrence and the value
    /// of its last one.
    pub fn from_records(records: Vec<R>) -> Self {
        let mut collection = Self::new();
        for record in records {
            if collection.upsert(record).is_some() {
                warn!("Duplicate record id in fetched list; keeping the latest value");
            }
        }
        collection
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of the record with `id`.
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Record with `id`.
    pub fn get(&self, id: RecordId) -> Option<&R> {
        self.position(id).map(|i| &self.records[i])
    }

    /// Mutable access to the record with `id`. The id itself must not be changed.
    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut R> {
        self.position(id).map(move |i| &mut self.records[i])
    }

    /// Record at `position`.
    pub fn at(&self, position: usize) -> Option<&R> {
        self.records.get(position)
    }

    /// Replaces the record at `position` in place, returning the previous value.
    ///
    /// Fails if the position is out of range or if the incoming id already
    /// belongs to a different position.
    pub fn replace_at(&mut self, position: usize, record: R) -> Result<R, QuoteError> {
        let id = record.id();
        let previous_id = self
            .records
            .get(position)
            .map(Record::id)
            .ok_or(QuoteError::NotFound(position as RecordId))?;
        if let Some(&other) = self.index.get(&id) {
            if other != position {
                return Err(QuoteError::Duplicate(id));
            }
        }
        self.index.remove(&previous_id);
        self.index.insert(id, position);
        Ok(std::mem::replace(&mut self.records[position], record))
    }

    /// Appends a new record; fails if its id is already present.
    pub fn insert(&mut self, record: R) -> Result<(), QuoteError> {
        let id = record.id();
        if self.index.contains_key(&id) {
            return Err(QuoteError::Duplicate(id));
        }
        self.index.insert(id, self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Replaces the record with the same id in place, or appends it.
    /// Returns the replaced value, if any.
    pub fn upsert(&mut self, record: R) -> Option<R> {
        match self.position(record.id()) {
            Some(i) => Some(std::mem::replace(&mut self.records[i], record)),
            None => {
                self.index.insert(record.id(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    /// Removes and returns the record with `id`.
    pub fn remove(&mut self, id: RecordId) -> Option<R> {
        let position = self.index.remove(&id)?;
        let removed = self.records.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Replaces the whole content with `records`.
    pub fn replace_all(&mut self, records: Vec<R>) {
        *self = Self::from_records(records);
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }

    /// Iterates in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    /// Records in display order.
    pub fn as_slice(&self) -> &[R] {
        &self.records
    }

    /// Clones the records into a `Vec`.
    pub fn to_vec(&self) -> Vec<R> {
        self.records.clone()
    }
}

impl<'a, R: Record> IntoIterator for &'a Collection<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
