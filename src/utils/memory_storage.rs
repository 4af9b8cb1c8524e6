//! In-memory table source for testing

use std::collections::HashMap;

use crate::config::DatasetLayout;
use crate::tabular::Table;
use crate::traits::*;
use crate::types::*;

/// In-memory source holding already-loaded tables, one per dataset
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: HashMap<DatasetKind, Table>,
}

impl MemoryStorage {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the table for a dataset, replacing any previous one
    pub fn insert(&mut self, kind: DatasetKind, table: Table) {
        self.tables.insert(kind, table);
    }

    /// Builder form of [`MemoryStorage::insert`]
    pub fn with_table(mut self, kind: DatasetKind, table: Table) -> Self {
        self.insert(kind, table);
        self
    }

    /// Drop a dataset, as if it was never supplied
    pub fn remove(&mut self, kind: DatasetKind) -> Option<Table> {
        self.tables.remove(&kind)
    }

    /// Drop every dataset
    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

impl TableSource for MemoryStorage {
    fn is_supplied(&self, kind: DatasetKind) -> bool {
        self.tables.contains_key(&kind)
    }

    fn load_table(&self, kind: DatasetKind, _layout: &DatasetLayout) -> BillingResult<Option<Table>> {
        Ok(self.tables.get(&kind).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplied_tables() {
        let mut storage = MemoryStorage::new()
            .with_table(DatasetKind::SupplierRoster, Table::from_strings(&["Iccid"], &[&["1"]]));
        let layout = DatasetLayout::default();

        assert!(storage.is_supplied(DatasetKind::SupplierRoster));
        assert!(!storage.is_supplied(DatasetKind::TestChipList));
        assert_eq!(
            storage
                .load_table(DatasetKind::SupplierRoster, &layout)
                .unwrap()
                .map(|t| t.len()),
            Some(1)
        );

        storage.remove(DatasetKind::SupplierRoster);
        assert!(storage
            .load_table(DatasetKind::SupplierRoster, &layout)
            .unwrap()
            .is_none());
    }
}
