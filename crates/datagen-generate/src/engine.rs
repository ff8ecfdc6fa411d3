use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Utc;
use datagen_core::{Error as SchemaError, NodeKind, SchemaNode, TableSchemas, normalize};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::GenerationError;
use crate::faker_rs::{FakeRsAdapter, LocaleKey};
use crate::foreign::Record;
use crate::generators::{SampleContext, Sampler};
use crate::model::{GenerateOptions, GenerationIssue, GenerationReport, TableReport};
use crate::planner::{GenerationTask, plan_tables};
use crate::session::GenerationSession;

/// Table name -> raw schema node, as read from a schema document.
pub type SchemaMap = BTreeMap<String, Value>;

/// Table name -> generated records.
pub type TableData = BTreeMap<String, Vec<Record>>;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub data: TableData,
    pub report: GenerationReport,
}

impl GenerationResult {
    pub fn rows(&self, table: &str) -> &[Record] {
        self.data.get(table).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Entry point for generating datasets from table schemas.
///
/// The engine holds only options; each call builds its own session, so one
/// engine can serve concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    /// Generate every table named in `counts`, parents before children.
    pub fn generate(
        &self,
        schemas: &SchemaMap,
        counts: &BTreeMap<String, u64>,
    ) -> Result<GenerationResult, GenerationError> {
        self.run(schemas, counts, TableData::new())
    }

    /// Generate `count` records of a single schema stored under `name`.
    pub fn generate_table(
        &self,
        name: &str,
        schema: &Value,
        count: u64,
    ) -> Result<GenerationResult, GenerationError> {
        if count == 0 {
            return Err(GenerationError::InvalidInput(
                "count must be greater than 0".to_string(),
            ));
        }
        let schemas = SchemaMap::from([(name.to_string(), schema.clone())]);
        let counts = BTreeMap::from([(name.to_string(), count)]);
        self.run(&schemas, &counts, TableData::new())
    }

    /// Like [`generate`](Self::generate), with rows of tables outside the
    /// batch available to `ref` columns. Generated tables replace preloaded
    /// rows of the same name.
    pub fn generate_with_references(
        &self,
        schemas: &SchemaMap,
        counts: &BTreeMap<String, u64>,
        reference_rows: TableData,
    ) -> Result<GenerationResult, GenerationError> {
        self.run(schemas, counts, reference_rows)
    }

    fn run(
        &self,
        schemas: &SchemaMap,
        counts: &BTreeMap<String, u64>,
        reference_rows: TableData,
    ) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let seed = self.options.seed.unwrap_or_else(|| rand::rng().random());
        let base_date = self
            .options
            .base_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let locale: LocaleKey = self.options.locale.parse()?;

        if schemas.is_empty() {
            return Err(GenerationError::InvalidInput(
                "no table schemas provided".to_string(),
            ));
        }
        let tables = parse_requested(schemas, counts)?;
        let unrequested: Vec<String> = schemas
            .keys()
            .filter(|table| !counts.contains_key(*table))
            .cloned()
            .collect();
        let plan = plan_tables(&tables, &unrequested, counts, self.options.max_records_per_table)?;

        let mut report = GenerationReport::new(run_id.clone(), seed, base_date);
        report.generation_order = plan.order.clone();
        report.cycles = plan.cycles.clone();
        let mut session = GenerationSession::new(report);
        let preloaded: Vec<String> = reference_rows.keys().cloned().collect();
        for (table, rows) in reference_rows {
            session.publish_table(&table, rows);
        }
        for skipped in &plan.skipped {
            session.report_mut().skipped_tables.push(skipped.table.clone());
            session.warn_once(GenerationIssue {
                table: Some(skipped.table.clone()),
                ..GenerationIssue::warning(
                    "table_skipped",
                    format!("table '{}' skipped: {}", skipped.table, skipped.reason),
                )
            });
        }

        let sampler = Sampler::new(FakeRsAdapter::new(locale), base_date, self.options.strict_patterns);

        info!(
            run_id = %run_id,
            tables = plan.tasks.len(),
            seed,
            base_date = %base_date,
            locale = %locale,
            preloaded = preloaded.len(),
            "generation started"
        );

        for task in &plan.tasks {
            let table_start = Instant::now();
            let schema = tables.get(&task.table).ok_or_else(|| {
                GenerationError::InvalidInput(format!("table '{}' has no schema", task.table))
            })?;
            info!(table = %task.table, rows = task.rows, "generating table");

            let rows = match generate_rows(&sampler, schema, task, seed, &mut session) {
                Ok(rows) => rows,
                Err(err) => {
                    warn!(run_id = %run_id, table = %task.table, error = %err, "generation failed");
                    return Err(err);
                }
            };

            let duration_ms = table_start.elapsed().as_millis() as u64;
            session.report_mut().tables.push(TableReport {
                table: task.table.clone(),
                rows_requested: task.rows,
                rows_generated: rows.len() as u64,
                duration_ms,
            });
            info!(
                table = %task.table,
                rows_generated = rows.len(),
                duration_ms,
                "table generated"
            );
            session.publish_table(&task.table, rows);
        }

        let (mut data, mut report) = session.finish();
        data.retain(|table, _| tables.contains_key(table));
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            run_id = %run_id,
            tables = report.tables.len(),
            records = report.total_records(),
            warnings = report.warnings.len(),
            duration_ms = report.duration_ms,
            "generation completed"
        );
        Ok(GenerationResult { data, report })
    }
}

/// Normalize and parse the schemas of requested tables, rejecting non-object
/// tables. Tables without a count are never read.
fn parse_requested(
    schemas: &SchemaMap,
    counts: &BTreeMap<String, u64>,
) -> Result<TableSchemas, GenerationError> {
    let mut tables = TableSchemas::new();
    for (table, raw) in schemas.iter().filter(|(table, _)| counts.contains_key(*table)) {
        let node = SchemaNode::from_value(&normalize(raw.clone())).map_err(|source| {
            GenerationError::TableSchema {
                table: table.clone(),
                source,
            }
        })?;
        if !matches!(node.kind, NodeKind::Object(_)) {
            return Err(GenerationError::TableSchema {
                table: table.clone(),
                source: SchemaError::InvalidSchema(
                    "table schema must be of type 'object'".to_string(),
                ),
            });
        }
        tables.insert(table.clone(), node);
    }
    Ok(tables)
}

fn generate_rows(
    sampler: &Sampler,
    schema: &SchemaNode,
    task: &GenerationTask,
    seed: u64,
    session: &mut GenerationSession,
) -> Result<Vec<Record>, GenerationError> {
    let table_seed = hash_seed(seed, &task.table);
    let mut rows = Vec::with_capacity(task.rows as usize);

    for row_index in 0..task.rows {
        let mut rng = ChaCha8Rng::seed_from_u64(hash_row_seed(table_seed, row_index));
        let mut ctx = SampleContext::new(&task.table, session, &mut rng);
        let record = sampler
            .sample(schema, None, &mut ctx)
            .and_then(|value| match value {
                Value::Object(record) => Ok(record),
                other => Err(SchemaError::InvalidSchema(format!(
                    "table record must be an object, got {other}"
                ))
                .into()),
            })
            .map_err(|source| GenerationError::Record {
                table: task.table.clone(),
                index: row_index + 1,
                source: Box::new(source),
            })?;
        rows.push(record);
    }

    Ok(rows)
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn hash_row_seed(table_seed: u64, row_index: u64) -> u64 {
    let hash = table_seed ^ row_index.wrapping_mul(0x9e3779b97f4a7c15);
    hash.wrapping_mul(0x100000001b3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn options(seed: u64) -> GenerateOptions {
        GenerateOptions {
            seed: Some(seed),
            base_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..GenerateOptions::default()
        }
    }

    #[test]
    fn row_seeds_differ_per_table_and_row() {
        let users = hash_seed(7, "users");
        let orders = hash_seed(7, "orders");
        assert_ne!(users, orders);
        assert_ne!(hash_row_seed(users, 0), hash_row_seed(users, 1));
    }

    #[test]
    fn record_failures_name_table_and_index() {
        let engine = GenerationEngine::new(options(1));
        let schemas = SchemaMap::from([(
            "orders".to_string(),
            json!({"type": "object", "properties": {"user": {"type": "ref", "ref": "users.id"}}}),
        )]);
        let counts = BTreeMap::from([("orders".to_string(), 3)]);

        let err = engine.generate(&schemas, &counts).unwrap_err();
        let GenerationError::Record { table, index, .. } = &err else {
            panic!("expected record error, got {err}");
        };
        assert_eq!(table, "orders");
        assert_eq!(*index, 1);
    }

    #[test]
    fn table_schema_must_be_object() {
        let engine = GenerationEngine::new(options(1));
        let err = engine
            .generate_table("Data", &json!({"type": "string"}), 1)
            .unwrap_err();
        assert!(err.to_string().contains("Data"));
    }

    #[test]
    fn unrequested_tables_are_not_parsed() {
        let schemas = SchemaMap::from([
            (
                "good".to_string(),
                json!({"type": "object", "properties": {"id": {"type": "integer"}}}),
            ),
            ("broken".to_string(), json!({"type": "string"})),
        ]);
        let counts = BTreeMap::from([("good".to_string(), 1)]);

        let tables = parse_requested(&schemas, &counts).expect("parse");
        assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["good"]);

        let counts = BTreeMap::from([("broken".to_string(), 1)]);
        let err = parse_requested(&schemas, &counts).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn zero_count_single_table_is_rejected() {
        let engine = GenerationEngine::new(options(1));
        let schema = json!({"type": "object", "properties": {"id": {"type": "integer"}}});
        assert!(engine.generate_table("Data", &schema, 0).is_err());
    }

    #[test]
    fn unknown_locale_is_rejected() {
        let engine = GenerationEngine::new(GenerateOptions {
            locale: "xx_XX".to_string(),
            ..options(1)
        });
        let schema = json!({"type": "object", "properties": {"id": {"type": "integer"}}});
        assert!(engine.generate_table("Data", &schema, 1).is_err());
    }
}
