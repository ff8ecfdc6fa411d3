use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default ceiling on records generated for a single table.
pub const MAX_RECORDS_PER_TABLE: u64 = 100_000;

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Seed for every random draw. A random seed is chosen when absent.
    pub seed: Option<u64>,
    /// Anchor of the date window. Today (UTC) when absent.
    pub base_date: Option<NaiveDate>,
    /// Faker locale (`en_US` or `pt_BR`).
    pub locale: String,
    /// Maximum records requested for a single table.
    pub max_records_per_table: u64,
    /// Fail on pattern syntax the pattern generator does not understand.
    pub strict_patterns: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed: None,
            base_date: None,
            locale: "en_US".to_string(),
            max_records_per_table: MAX_RECORDS_PER_TABLE,
            strict_patterns: false,
        }
    }
}

/// Summary of a generated table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub duration_ms: u64,
}

/// Structured generation issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl GenerationIssue {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.to_string(),
            message: message.into(),
            table: None,
            field: None,
        }
    }

    pub fn at(mut self, table: &str, field: &str) -> Self {
        self.table = Some(table.to_string());
        self.field = Some(field.to_string());
        self
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub base_date: NaiveDate,
    pub generation_order: Vec<String>,
    pub cycles: Vec<Vec<String>>,
    pub tables: Vec<TableReport>,
    pub skipped_tables: Vec<String>,
    pub generator_usage: BTreeMap<String, u64>,
    pub fallback_count: u64,
    pub duration_ms: u64,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<GenerationIssue>,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64, base_date: NaiveDate) -> Self {
        Self {
            run_id,
            seed,
            base_date,
            generation_order: Vec::new(),
            cycles: Vec::new(),
            tables: Vec::new(),
            skipped_tables: Vec::new(),
            generator_usage: BTreeMap::new(),
            fallback_count: 0,
            duration_ms: 0,
            warnings_by_code: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Total records generated across tables.
    pub fn total_records(&self) -> u64 {
        self.tables.iter().map(|table| table.rows_generated).sum()
    }

    pub fn record_generator_usage(&mut self, id: &str) {
        match self.generator_usage.get_mut(id) {
            Some(count) => *count += 1,
            None => {
                self.generator_usage.insert(id.to_string(), 1);
            }
        }
    }

    pub fn record_fallback(&mut self) {
        self.fallback_count += 1;
    }

    pub fn record_warning(&mut self, issue: GenerationIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }
}
