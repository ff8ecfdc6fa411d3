use std::collections::BTreeMap;

use datagen_core::{TableSchemas, build_dependency_report};
use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;

/// Planned generation task for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    pub table: String,
    pub rows: u64,
}

/// A table left out of the run and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTable {
    pub table: String,
    pub reason: String,
}

/// Tasks in dependency order, plus what the ordering had to work around.
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub tasks: Vec<GenerationTask>,
    pub order: Vec<String>,
    pub cycles: Vec<Vec<String>>,
    pub skipped: Vec<SkippedTable>,
}

/// Combine the dependency order of the requested `tables` with `counts`.
///
/// `unrequested` names tables that have a schema but no count; they are
/// skipped, as are counted tables without a schema. A count above `limit`
/// fails the whole plan.
pub fn plan_tables(
    tables: &TableSchemas,
    unrequested: &[String],
    counts: &BTreeMap<String, u64>,
    limit: u64,
) -> Result<GenerationPlan, GenerationError> {
    if counts.is_empty() {
        return Err(GenerationError::InvalidInput(
            "no record counts provided".to_string(),
        ));
    }
    for (table, count) in counts {
        if *count > limit {
            return Err(GenerationError::CountLimit {
                table: table.clone(),
                count: *count,
                limit,
            });
        }
    }

    let report = build_dependency_report(tables);
    let mut tasks = Vec::with_capacity(report.order.len());
    let mut skipped: Vec<SkippedTable> = unrequested
        .iter()
        .map(|table| SkippedTable {
            table: table.clone(),
            reason: "no record count".to_string(),
        })
        .collect();

    for table in &report.order {
        if let Some(rows) = counts.get(table) {
            tasks.push(GenerationTask {
                table: table.clone(),
                rows: *rows,
            });
        }
    }
    for table in counts.keys() {
        if !tables.contains_key(table) {
            skipped.push(SkippedTable {
                table: table.clone(),
                reason: "no schema".to_string(),
            });
        }
    }

    Ok(GenerationPlan {
        tasks,
        order: report.order,
        cycles: report.cycles,
        skipped,
    })
}
