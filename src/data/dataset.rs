use uuid::Uuid;

use super::source::MemorySource;
use super::{DataSource, Result, Table};

/// Cached view over a data source.
///
/// A data set normally pulls from its source. When `mirrors_deck` is set the
/// direction is reversed: an independent deck owns the cards and the data set
/// pushes them out to the source.
#[derive(Debug)]
pub struct DataSet {
    pub id: Uuid,
    source: Box<dyn DataSource>,
    table: Table,
    mirrors_deck: bool,
}

impl DataSet {
    /// Open a data set and pull its current contents
    pub fn load(source: Box<dyn DataSource>, mirrors_deck: bool) -> Result<Self> {
        let table = source.pull()?;
        log::info!(
            "Loaded data set {} ({} rows)",
            source.name(),
            table.num_rows()
        );
        Ok(Self {
            id: Uuid::new_v4(),
            source,
            table,
            mirrors_deck,
        })
    }

    /// Create an empty data set that mirrors an independent deck.
    ///
    /// Nothing is pulled; the source is written on the first push.
    pub fn mirror(source: Box<dyn DataSource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            table: Table::new(),
            mirrors_deck: true,
        }
    }

    /// Re-pull the table from the source
    pub fn reload(&mut self) -> Result<()> {
        self.table = self.source.pull()?;
        log::info!(
            "Reloaded data set {} ({} rows)",
            self.source.name(),
            self.table.num_rows()
        );
        Ok(())
    }

    /// Write a table to the source and cache it
    pub fn push(&mut self, table: Table) -> Result<()> {
        self.source.push(&table)?;
        self.table = table;
        Ok(())
    }

    /// New read-only data set restricted to `fields`
    pub fn project(&self, fields: &[&str]) -> Result<DataSet> {
        let table = self.table.project(fields)?;
        let name = format!("{} [{}]", self.name(), fields.join(", "));
        Ok(DataSet {
            id: Uuid::new_v4(),
            source: Box::new(MemorySource::new(name, table.clone(), true)),
            table,
            mirrors_deck: false,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn header(&self) -> Vec<&str> {
        self.table.header()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.table.field(name)
    }

    pub fn row(&self, index: usize) -> Option<Vec<&str>> {
        self.table.row(index)
    }

    pub fn num_rows(&self) -> usize {
        self.table.num_rows()
    }

    pub fn source(&self) -> &dyn DataSource {
        self.source.as_ref()
    }

    pub fn name(&self) -> String {
        self.source.name()
    }

    pub fn location(&self) -> String {
        self.source.location()
    }

    pub fn mirrors_deck(&self) -> bool {
        self.mirrors_deck
    }

    pub fn is_read_only(&self) -> bool {
        self.source.is_read_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataError;

    fn countries() -> Table {
        Table::from_columns(vec![
            ("city", vec!["Paris".to_string(), "Rome".to_string()]),
            ("country", vec!["France".to_string(), "Italy".to_string()]),
            ("population", vec!["2.1M".to_string(), "2.8M".to_string()]),
        ])
        .unwrap()
    }

    #[test]
    fn test_load_and_lookup() {
        let source = MemorySource::new("countries", countries(), true);
        let data_set = DataSet::load(Box::new(source), false).unwrap();

        assert_eq!(data_set.header(), vec!["city", "country", "population"]);
        assert_eq!(data_set.field("city").unwrap()[1], "Rome");
        assert_eq!(data_set.row(0).unwrap(), vec!["Paris", "France", "2.1M"]);
        assert_eq!(data_set.name(), "countries");
    }

    #[test]
    fn test_project_is_read_only() {
        let source = MemorySource::new("countries", countries(), false);
        let data_set = DataSet::load(Box::new(source), false).unwrap();

        let mut projected = data_set.project(&["city", "country"]).unwrap();
        assert_eq!(projected.header(), vec!["city", "country"]);
        assert!(projected.is_read_only());
        assert!(matches!(
            projected.push(Table::new()),
            Err(DataError::ReadOnly(_))
        ));
    }

    #[test]
    fn test_reload_sees_source_changes() {
        let source = MemorySource::new("countries", countries(), false);
        let mut data_set = DataSet::load(Box::new(source), false).unwrap();

        let smaller = countries().project(&["city"]).unwrap();
        data_set.push(smaller.clone()).unwrap();
        data_set.reload().unwrap();
        assert_eq!(data_set.table(), &smaller);
    }
}
