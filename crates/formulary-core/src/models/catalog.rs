//! Loaded drug catalog with name lookup.

use std::collections::HashMap;

use super::DrugRecord;

/// A read-only set of drug records in load order.
///
/// Row indices are stable for the lifetime of the catalog. When several rows
/// share a name (case-insensitively) the first one is authoritative for lookups;
/// the others still take part in similarity search.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<DrugRecord>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from records in load order.
    pub fn new(records: Vec<DrugRecord>) -> Self {
        let mut by_name = HashMap::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let key = record.name_key();
            if by_name.contains_key(&key) {
                tracing::warn!(name = %record.name, index, "duplicate drug name, keeping first occurrence");
                continue;
            }
            by_name.insert(key, index);
        }
        Self { records, by_name }
    }

    /// Find a record by case-insensitive exact name.
    pub fn find(&self, name: &str) -> Option<(usize, &DrugRecord)> {
        let index = *self.by_name.get(&name.to_lowercase())?;
        Some((index, &self.records[index]))
    }

    /// Get a record by row index.
    pub fn get(&self, index: usize) -> Option<&DrugRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[DrugRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct names in load order (first occurrences only).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .enumerate()
            .filter(|(index, record)| self.by_name.get(&record.name_key()) == Some(index))
            .map(|(_, record)| record.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive() {
        let catalog = Catalog::new(vec![
            DrugRecord::new("Aspirin"),
            DrugRecord::new("Ibuprofen"),
        ]);

        let (index, record) = catalog.find("IBUPROFEN").unwrap();
        assert_eq!(index, 1);
        assert_eq!(record.name, "Ibuprofen");
        assert!(catalog.find("ibu").is_none());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let catalog = Catalog::new(vec![
            DrugRecord::new("Aspirin").with_base_cost(1.0),
            DrugRecord::new("aspirin").with_base_cost(2.0),
        ]);

        let (index, record) = catalog.find("Aspirin").unwrap();
        assert_eq!(index, 0);
        assert_eq!(record.base_cost_value(), Some(1.0));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["Aspirin"]);
    }
}
