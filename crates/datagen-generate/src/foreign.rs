use std::collections::BTreeMap;

use datagen_core::Reference;
use rand::{Rng, RngCore};
use serde_json::{Map, Value};

use crate::errors::GenerationError;

/// One generated row: column name -> value.
pub type Record = Map<String, Value>;

/// Source of values for `ref` columns.
pub trait ReferenceSource {
    fn pick_reference(
        &self,
        reference: &Reference,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError>;
}

/// Rows of a column's table that carry a value for it.
#[derive(Debug, Clone)]
enum ColumnRows {
    All,
    Only(Vec<usize>),
}

#[derive(Debug, Default, Clone)]
struct TableRows {
    rows: Vec<Record>,
    columns: BTreeMap<String, ColumnRows>,
}

/// Completed tables, each with a column index so picks do not rescan rows.
///
/// The store owns the rows; the index holds positions, never copies.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReferenceStore {
    tables: BTreeMap<String, TableRows>,
}

impl InMemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `rows` of `table`, replacing any previous rows.
    pub fn ingest_table(&mut self, table: &str, rows: Vec<Record>) {
        let mut positions: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, row) in rows.iter().enumerate() {
            for column in row.keys() {
                positions.entry(column.clone()).or_default().push(idx);
            }
        }
        let columns = positions
            .into_iter()
            .map(|(column, positions)| {
                let rows = if positions.len() == rows.len() {
                    ColumnRows::All
                } else {
                    ColumnRows::Only(positions)
                };
                (column, rows)
            })
            .collect();
        self.tables
            .insert(table.to_string(), TableRows { rows, columns });
    }

    /// Hand back every table's rows.
    pub fn into_tables(self) -> BTreeMap<String, Vec<Record>> {
        self.tables
            .into_iter()
            .map(|(table, data)| (table, data.rows))
            .collect()
    }
}

impl ReferenceSource for InMemoryReferenceStore {
    fn pick_reference(
        &self,
        reference: &Reference,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let table = self.tables.get(&reference.table).ok_or_else(|| {
            GenerationError::UnresolvedReference {
                reference: reference.to_string(),
                reason: format!("table '{}' has not been generated yet", reference.table),
            }
        })?;
        let missing_column = || GenerationError::UnresolvedReference {
            reference: reference.to_string(),
            reason: format!(
                "no generated row of '{}' contains column '{}'",
                reference.table, reference.column
            ),
        };

        let idx = match table.columns.get(&reference.column) {
            Some(ColumnRows::All) if !table.rows.is_empty() => {
                rng.random_range(0..table.rows.len())
            }
            Some(ColumnRows::Only(positions)) if !positions.is_empty() => {
                positions[rng.random_range(0..positions.len())]
            }
            _ => return Err(missing_column()),
        };
        table.rows[idx]
            .get(&reference.column)
            .cloned()
            .ok_or_else(missing_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn picks_only_generated_values() {
        let mut store = InMemoryReferenceStore::new();
        store.ingest_table(
            "users",
            vec![
                record(json!({"id": 1})),
                record(json!({"id": 2, "name": "b"})),
            ],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let reference = Reference::parse("users.id").expect("reference");

        for _ in 0..20 {
            let value = store.pick_reference(&reference, &mut rng).expect("pick");
            assert!(value == json!(1) || value == json!(2));
        }
        let name = Reference::parse("users.name").expect("reference");
        assert_eq!(store.pick_reference(&name, &mut rng).expect("pick"), json!("b"));
    }

    #[test]
    fn missing_table_or_column_is_an_error() {
        let mut store = InMemoryReferenceStore::new();
        store.ingest_table("users", vec![record(json!({"id": 1}))]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let err = store
            .pick_reference(&Reference::parse("orders.id").expect("ref"), &mut rng)
            .unwrap_err();
        assert!(err.to_string().contains("has not been generated"));

        let err = store
            .pick_reference(&Reference::parse("users.email").expect("ref"), &mut rng)
            .unwrap_err();
        assert!(err.to_string().contains("contains column 'email'"));
    }

    #[test]
    fn replaced_tables_drop_old_rows() {
        let mut store = InMemoryReferenceStore::new();
        store.ingest_table("users", vec![record(json!({"id": 1}))]);
        store.ingest_table("users", vec![record(json!({"id": 9}))]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let reference = Reference::parse("users.id").expect("reference");
        assert_eq!(store.pick_reference(&reference, &mut rng).expect("pick"), json!(9));
        let tables = store.into_tables();
        assert_eq!(tables["users"], vec![record(json!({"id": 9}))]);
    }
}
