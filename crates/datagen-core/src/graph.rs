use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::schema::TableSchemas;

/// Summary of the reference graph between tables of one batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencySummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Generation order plus the cycles that had to be broken to produce it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyReport {
    pub summary: DependencySummary,
    /// Parents before children; every table of the batch exactly once.
    pub order: Vec<String>,
    /// Each cycle as the path of tables on the stack when it closed.
    pub cycles: Vec<Vec<String>>,
}

/// Order tables so referenced tables come before the tables that reference them.
///
/// Cycles never fail: they are logged and broken at the table that closes them.
pub fn determine_generation_order(tables: &TableSchemas) -> Vec<String> {
    build_dependency_report(tables).order
}

/// Same ordering as [`determine_generation_order`], keeping graph details.
pub fn build_dependency_report(tables: &TableSchemas) -> DependencyReport {
    let graph = build_adjacency(tables);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();

    let mut walk = DepthFirst {
        graph: &graph,
        visited: BTreeSet::new(),
        stack: Vec::new(),
        order: Vec::with_capacity(nodes),
        cycles: Vec::new(),
    };
    for table in graph.keys() {
        walk.visit(*table);
    }

    DependencyReport {
        summary: DependencySummary { nodes, edges },
        order: walk.order,
        cycles: walk.cycles,
    }
}

/// Table -> tables it references, restricted to tables of the batch.
fn build_adjacency(tables: &TableSchemas) -> BTreeMap<&str, BTreeSet<&str>> {
    let mut graph: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for (name, schema) in tables {
        let deps = graph.entry(name.as_str()).or_default();
        for reference in schema.references() {
            if let Some((target, _)) = tables.get_key_value(reference.table.as_str()) {
                deps.insert(target.as_str());
            }
        }
    }

    graph
}

struct DepthFirst<'a> {
    graph: &'a BTreeMap<&'a str, BTreeSet<&'a str>>,
    visited: BTreeSet<&'a str>,
    stack: Vec<&'a str>,
    order: Vec<String>,
    cycles: Vec<Vec<String>>,
}

impl<'a> DepthFirst<'a> {
    fn visit(&mut self, table: &'a str) {
        if let Some(position) = self.stack.iter().position(|entry| *entry == table) {
            let mut cycle: Vec<String> = self.stack[position..]
                .iter()
                .map(|entry| entry.to_string())
                .collect();
            cycle.push(table.to_string());
            warn!(table = %table, cycle = %cycle.join(" -> "), "circular dependency detected");
            self.cycles.push(cycle);
            return;
        }
        if self.visited.contains(table) {
            return;
        }

        let graph = self.graph;
        self.stack.push(table);
        if let Some(deps) = graph.get(table) {
            for dep in deps {
                self.visit(*dep);
            }
        }
        self.stack.pop();

        self.visited.insert(table);
        self.order.push(table.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_table_schemas;
    use serde_json::json;

    fn position(order: &[String], table: &str) -> usize {
        order
            .iter()
            .position(|item| item == table)
            .expect("table in order")
    }

    #[test]
    fn orders_parents_before_children() {
        // Lexicographic order is the reverse of the dependency order.
        let tables = parse_table_schemas(&json!({
            "a": {"type": "object", "properties": {
                "b": {"type": "ref", "ref": "b.id"},
                "c": {"type": "ref", "ref": "c.id"}
            }},
            "b": {"type": "object", "properties": {
                "id": {"type": "integer"},
                "c": {"type": "ref", "ref": "c.id"}
            }},
            "c": {"type": "object", "properties": {"id": {"type": "integer"}}}
        }))
        .expect("parse");

        let order = determine_generation_order(&tables);
        assert_eq!(order, vec!["c".to_string(), "b".to_string(), "a".to_string()]);
        assert!(position(&order, "c") < position(&order, "b"));
        assert!(position(&order, "b") < position(&order, "a"));
    }

    #[test]
    fn breaks_cycles_without_failing() {
        let tables = parse_table_schemas(&json!({
            "X": {"type": "object", "properties": {"y": {"type": "ref", "ref": "Y.id"}}},
            "Y": {"type": "object", "properties": {"x": {"type": "ref", "ref": "X.id"}}}
        }))
        .expect("parse");

        let report = build_dependency_report(&tables);
        assert_eq!(report.order, vec!["Y".to_string(), "X".to_string()]);
        assert_eq!(
            report.cycles,
            vec![vec!["X".to_string(), "Y".to_string(), "X".to_string()]]
        );
        assert_eq!(report.summary, DependencySummary { nodes: 2, edges: 2 });
    }

    #[test]
    fn ignores_references_outside_batch() {
        let tables = parse_table_schemas(&json!({
            "orders": {"type": "object", "properties": {
                "user": {"type": "ref", "ref": "users.id"}
            }}
        }))
        .expect("parse");

        let report = build_dependency_report(&tables);
        assert_eq!(report.order, vec!["orders".to_string()]);
        assert_eq!(report.summary.edges, 0);
    }

    #[test]
    fn follows_nested_references() {
        let tables = parse_table_schemas(&json!({
            "a_lines": {"type": "object", "properties": {
                "items": {"type": "array", "items": {"type": "ref", "ref": "z_products.sku"}}
            }},
            "z_products": {"type": "object", "properties": {"sku": {"type": "string"}}}
        }))
        .expect("parse");

        let order = determine_generation_order(&tables);
        assert_eq!(order, vec!["z_products".to_string(), "a_lines".to_string()]);
    }
}
