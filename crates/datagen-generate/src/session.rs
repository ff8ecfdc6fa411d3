use std::collections::{BTreeMap, HashMap, HashSet};

use datagen_core::RefSpec;
use rand::RngCore;
use serde_json::Value;
use tracing::warn;

use crate::errors::GenerationError;
use crate::foreign::{InMemoryReferenceStore, Record, ReferenceSource};
use crate::model::{GenerationIssue, GenerationReport};

/// Mutable state of one top-level generation call.
///
/// A session is created per call and threaded through the sampler by `&mut`,
/// so concurrent calls never observe each other's rows or counters.
#[derive(Debug)]
pub struct GenerationSession {
    references: InMemoryReferenceStore,
    /// String primary keys, keyed by their 3-char prefix.
    pk_counters: HashMap<String, u64>,
    /// Integer primary keys, keyed by table.
    integer_keys: HashMap<String, i64>,
    issued: HashMap<&'static str, HashSet<String>>,
    reported: HashSet<(String, Option<String>, Option<String>)>,
    report: GenerationReport,
}

impl GenerationSession {
    pub fn new(report: GenerationReport) -> Self {
        Self {
            references: InMemoryReferenceStore::new(),
            pk_counters: HashMap::new(),
            integer_keys: HashMap::new(),
            issued: HashMap::new(),
            reported: HashSet::new(),
            report,
        }
    }

    /// Make a completed table visible to `ref` columns of later tables.
    pub fn publish_table(&mut self, table: &str, rows: Vec<Record>) {
        self.references.ingest_table(table, rows);
    }

    /// Draw a value for a `ref` node among the rows generated so far.
    pub fn resolve_reference(
        &self,
        spec: &RefSpec,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let reference = spec.reference()?;
        self.references.pick_reference(&reference, rng)
    }

    /// Next value of the per-prefix counter, starting at 1.
    pub fn next_pk_counter(&mut self, prefix: &str) -> u64 {
        let counter = self.pk_counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Next integer key of `table`, starting at 1.
    pub fn next_integer_key(&mut self, table: &str) -> i64 {
        let counter = self.integer_keys.entry(table.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Claim `value` for the `kind` namespace; false when already issued.
    pub fn claim_unique(&mut self, kind: &'static str, value: &str) -> bool {
        self.issued
            .entry(kind)
            .or_default()
            .insert(value.to_string())
    }

    pub fn report_mut(&mut self) -> &mut GenerationReport {
        &mut self.report
    }

    /// Record a warning once per code, table and field.
    pub fn warn_once(&mut self, issue: GenerationIssue) {
        let key = (issue.code.clone(), issue.table.clone(), issue.field.clone());
        if !self.reported.insert(key) {
            return;
        }
        warn!(
            code = %issue.code,
            table = issue.table.as_deref().unwrap_or(""),
            field = issue.field.as_deref().unwrap_or(""),
            message = %issue.message
        );
        self.report.record_warning(issue);
    }

    /// Split the session into the generated tables and the run report.
    pub fn finish(self) -> (BTreeMap<String, Vec<Record>>, GenerationReport) {
        (self.references.into_tables(), self.report)
    }
}
