use std::collections::{BTreeMap, BTreeSet};

use crate::registry::Registry;

/// Edges from each referenced table to the tables whose foreign keys point at it.
pub(crate) type DependencyGraph = BTreeMap<String, BTreeSet<String>>;

/// Build the foreign key graph of every registered schema, keyed by table name.
pub(crate) fn build_dependency_graph(registry: &Registry) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for schema in registry.iter() {
        let table = schema.table_name();
        graph.entry(table.clone()).or_default();

        for column in schema.columns() {
            let Some(target) = column.field.foreign_key_target() else {
                continue;
            };
            let referenced = target.to_lowercase();
            // Postgres accepts a table referencing itself in its own definition.
            if referenced == table {
                continue;
            }
            graph.entry(referenced).or_default().insert(table.clone());
        }
    }

    graph
}

/// Kahn ordering, smallest name first among ready tables.
///
/// Returns the tables left with unresolved dependencies when a cycle exists.
pub(crate) fn creation_order(graph: &DependencyGraph) -> Result<Vec<String>, Vec<String>> {
    let mut pending: BTreeMap<&str, usize> = graph.keys().map(|node| (node.as_str(), 0)).collect();
    for dependents in graph.values() {
        for dependent in dependents {
            *pending.entry(dependent.as_str()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<&str> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();
    let mut order = Vec::with_capacity(pending.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.to_string());

        for dependent in graph.get(node).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent.as_str()) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ready.insert(dependent.as_str());
                }
            }
        }
    }

    if order.len() == pending.len() {
        Ok(order)
    } else {
        Err(pending
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(node, _)| node.to_string())
            .collect())
    }
}
