// In-memory working set
//
// Records in display order plus a basename -> position index, kept in step
// on every insert, removal and reorder.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::recording::Recording;

#[derive(Debug, Default)]
pub struct WorkingSet {
    records: Vec<Recording>,
    index: HashMap<String, usize>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later records with an already-seen basename replace the earlier one
    pub fn from_records(records: Vec<Recording>) -> Self {
        let mut set = Self::new();
        for rec in records {
            set.insert(rec);
        }
        set
    }

    /// Insert or replace by basename; a replaced record keeps its position.
    pub fn insert(&mut self, rec: Recording) {
        match self.index.get(&rec.file_basename) {
            Some(&pos) => self.records[pos] = rec,
            None => {
                self.index.insert(rec.file_basename.clone(), self.records.len());
                self.records.push(rec);
            }
        }
    }

    pub fn remove(&mut self, basename: &str) -> Option<Recording> {
        let pos = self.index.remove(basename)?;
        let rec = self.records.remove(pos);
        for (i, r) in self.records.iter().enumerate().skip(pos) {
            self.index.insert(r.file_basename.clone(), i);
        }
        Some(rec)
    }

    pub fn get(&self, basename: &str) -> Option<&Recording> {
        self.index.get(basename).map(|&pos| &self.records[pos])
    }

    pub fn get_mut(&mut self, basename: &str) -> Option<&mut Recording> {
        let pos = *self.index.get(basename)?;
        self.records.get_mut(pos)
    }

    pub fn contains(&self, basename: &str) -> bool {
        self.index.contains_key(basename)
    }

    pub fn position(&self, basename: &str) -> Option<usize> {
        self.index.get(basename).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in display order
    pub fn iter(&self) -> impl Iterator<Item = &Recording> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Recording> {
        self.records.iter_mut()
    }

    /// Stable sort, then rebuild the position index
    pub fn reorder<F>(&mut self, compare: F)
    where
        F: FnMut(&Recording, &Recording) -> Ordering,
    {
        self.records.sort_by(compare);
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.file_basename.clone(), i))
            .collect();
    }

    /// Basenames in display order
    pub fn basenames(&self) -> Vec<String> {
        self.records.iter().map(|r| r.file_basename.clone()).collect()
    }

    /// Basenames currently flagged for drop, in display order
    pub fn dropped_basenames(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.is_dropped)
            .map(|r| r.file_basename.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::tests::sample;

    fn set_of(names: &[&str]) -> WorkingSet {
        WorkingSet::from_records(names.iter().map(|n| sample(n, "Tatort", 1)).collect())
    }

    #[test]
    fn test_index_follows_removal() {
        let mut set = set_of(&["a", "b", "c", "d"]);
        assert_eq!(set.position("c"), Some(2));

        let removed = set.remove("b").unwrap();
        assert_eq!(removed.file_basename, "b");
        assert_eq!(set.len(), 3);
        assert_eq!(set.position("a"), Some(0));
        assert_eq!(set.position("c"), Some(1));
        assert_eq!(set.position("d"), Some(2));
        assert!(set.remove("b").is_none());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut set = set_of(&["a", "b"]);
        let mut b = sample("b", "Tatort", 99);
        b.is_good = true;
        set.insert(b);

        assert_eq!(set.len(), 2);
        assert_eq!(set.position("b"), Some(1));
        assert!(set.get("b").unwrap().is_good);
    }

    #[test]
    fn test_reorder_rebuilds_index() {
        let mut set = set_of(&["a", "b", "c"]);
        set.reorder(|x, y| y.file_basename.cmp(&x.file_basename));

        let order: Vec<&str> = set.iter().map(|r| r.file_basename.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
        assert_eq!(set.position("c"), Some(0));
        assert_eq!(set.position("a"), Some(2));
    }

    #[test]
    fn test_dropped_basenames() {
        let mut set = set_of(&["a", "b", "c"]);
        set.get_mut("c").unwrap().is_dropped = true;
        set.get_mut("a").unwrap().is_dropped = true;
        assert_eq!(set.dropped_basenames(), vec!["a", "c"]);
    }
}
