use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::document::SchemaDocument;

/// Summary of the relation graph structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationGraphSummary {
    pub nodes: usize,
    pub edges: usize,
    /// Relations whose owning and target tables live on different databases.
    pub cross_database_edges: usize,
}

/// Dependency report for the tables of a document.
///
/// Cycles are legal in a schema document; they only mean no dependency order
/// exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationGraphReport {
    pub summary: RelationGraphSummary,
    pub dependency_order: Option<Vec<String>>,
    /// Tables lying on a relation cycle; tables that merely depend on a cycle
    /// are left out.
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic relation dependency report.
///
/// Relations pointing at undefined tables are left out of the graph.
pub fn build_relation_graph_report(document: &SchemaDocument) -> RelationGraphReport {
    let graph = build_adjacency(document);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let cross_database_edges = document
        .relations()
        .filter(|(table_name, _, relation)| {
            match (document.table(table_name), document.table(&relation.table)) {
                (Some(owner), Some(target)) => owner.db != target.db,
                _ => false,
            }
        })
        .count();

    let summary = RelationGraphSummary {
        nodes,
        edges,
        cross_database_edges,
    };

    match toposort(&graph) {
        Ok(order) => RelationGraphReport {
            summary,
            dependency_order: Some(order),
            cycle: None,
        },
        Err(cycle) => RelationGraphReport {
            summary,
            dependency_order: None,
            cycle: Some(cycle),
        },
    }
}

// Edges run from the referenced table to the table holding the foreign key.
fn build_adjacency(document: &SchemaDocument) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (table_name, table) in &document.tables {
        graph.entry(table_name.clone()).or_default();

        for relation in table.relations.values() {
            if !document.tables.contains_key(&relation.table) {
                continue;
            }
            graph
                .entry(relation.table.clone())
                .or_default()
                .insert(table_name.clone());
        }
    }

    graph
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<String, usize> =
        graph.keys().map(|node| (node.clone(), 0)).collect();

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then(|| node.clone()))
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
        order.push(node);
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        // Unordered tables either sit on a cycle or only depend on one.
        let cycle_nodes: Vec<String> = indegree
            .into_iter()
            .filter(|(node, count)| *count > 0 && reaches_itself(graph, node))
            .map(|(node, _)| node)
            .collect();
        Err(cycle_nodes)
    }
}

fn reaches_itself(graph: &BTreeMap<String, BTreeSet<String>>, start: &str) -> bool {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut stack: Vec<&str> = graph
        .get(start)
        .map(|targets| targets.iter().map(String::as_str).collect())
        .unwrap_or_default();

    while let Some(node) = stack.pop() {
        if node == start {
            return true;
        }
        if !visited.insert(node) {
            continue;
        }
        if let Some(targets) = graph.get(node) {
            stack.extend(targets.iter().map(String::as_str));
        }
    }

    false
}
