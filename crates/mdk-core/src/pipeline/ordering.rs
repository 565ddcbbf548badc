//! Resolution of declared processor relations into one execution order
//!
//! Relations become edges of a directed graph (`a` before `b` is the edge
//! `a -> b`). Cycles are detected with Tarjan's SCC algorithm; the order
//! itself is a Kahn sort that always picks the ready processor registered
//! first, so unrelated processors keep their registration order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::ProcessorDescriptor;
use crate::error::PackError;
use crate::result::Result;

/// Resolve the execution order of `descriptors`, returned as indices into
/// the slice.
pub fn resolve_order(descriptors: &[ProcessorDescriptor]) -> Result<Vec<usize>> {
    let mut by_name: HashMap<&str, NodeIndex> = HashMap::new();
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(descriptors.len(), 0);

    for (index, descriptor) in descriptors.iter().enumerate() {
        let node = graph.add_node(index);
        if by_name.insert(descriptor.name.as_str(), node).is_some() {
            return Err(PackError::config_error(format!(
                "processor '{}' is registered twice",
                descriptor.name
            )));
        }
    }

    for (index, descriptor) in descriptors.iter().enumerate() {
        let node = NodeIndex::new(index);
        for target in &descriptor.run_before {
            let other = lookup(&by_name, descriptor, target)?;
            graph.update_edge(node, other, ());
        }
        for target in &descriptor.run_after {
            let other = lookup(&by_name, descriptor, target)?;
            graph.update_edge(other, node, ());
        }
    }

    if let Some(cycle) = find_cycle(&graph) {
        return Err(PackError::CyclicOrdering {
            processors: cycle
                .into_iter()
                .map(|node| descriptors[graph[node]].name.clone())
                .collect(),
        });
    }

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors_directed(node, Direction::Incoming).count())
        .collect();
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut order = Vec::with_capacity(descriptors.len());
    while let Some(Reverse(index)) = ready.pop() {
        order.push(index);
        for next in graph.neighbors_directed(NodeIndex::new(index), Direction::Outgoing) {
            let degree = &mut in_degree[next.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(next.index()));
            }
        }
    }

    if order.len() != descriptors.len() {
        return Err(PackError::internal_error(
            "processor ordering did not cover every processor",
        ));
    }
    Ok(order)
}

fn lookup(
    by_name: &HashMap<&str, NodeIndex>,
    descriptor: &ProcessorDescriptor,
    target: &str,
) -> Result<NodeIndex> {
    by_name
        .get(target)
        .copied()
        .ok_or_else(|| PackError::UnresolvedOrdering {
            processor: descriptor.name.clone(),
            target: target.to_string(),
        })
}

/// A cycle as a closed path (`a, b, a`), starting at the earliest registered
/// processor of the first cyclic component.
fn find_cycle(graph: &DiGraph<usize, ()>) -> Option<Vec<NodeIndex>> {
    let component = tarjan_scc(graph).into_iter().find(|component| {
        component.len() > 1 || graph.contains_edge(component[0], component[0])
    })?;

    let start = component.iter().copied().min_by_key(|node| node.index())?;
    if component.len() == 1 {
        return Some(vec![start, start]);
    }

    // Breadth-first search inside the component for a path back to start
    let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = std::collections::VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        let mut successors: Vec<NodeIndex> = graph
            .neighbors_directed(node, Direction::Outgoing)
            .filter(|next| component.contains(next))
            .collect();
        successors.sort_by_key(|next| next.index());
        for next in successors {
            if next == start {
                let mut path = vec![start];
                let mut current = node;
                while current != start {
                    path.push(current);
                    current = previous[&current];
                }
                path[1..].reverse();
                path.push(start);
                return Some(path);
            }
            if !previous.contains_key(&next) {
                previous.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(descriptors: &[ProcessorDescriptor], order: &[usize]) -> Vec<String> {
        order.iter().map(|index| descriptors[*index].name.clone()).collect()
    }

    #[test]
    fn test_after_relation_and_stable_position() {
        let descriptors = vec![
            ProcessorDescriptor::new("b").after("a"),
            ProcessorDescriptor::new("c"),
            ProcessorDescriptor::new("a"),
        ];
        let order = resolve_order(&descriptors).unwrap();
        assert_eq!(names(&descriptors, &order), vec!["c", "a", "b"]);

        for _ in 0..10 {
            assert_eq!(resolve_order(&descriptors).unwrap(), order);
        }
    }

    #[test]
    fn test_unrelated_keep_registration_order() {
        let descriptors = vec![
            ProcessorDescriptor::new("a"),
            ProcessorDescriptor::new("b").after("a"),
            ProcessorDescriptor::new("c"),
        ];
        let order = resolve_order(&descriptors).unwrap();
        assert_eq!(names(&descriptors, &order), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_before_relation() {
        let descriptors = vec![
            ProcessorDescriptor::new("late"),
            ProcessorDescriptor::new("early").before("late"),
        ];
        let order = resolve_order(&descriptors).unwrap();
        assert_eq!(names(&descriptors, &order), vec!["early", "late"]);
    }

    #[test]
    fn test_cycle_is_reported_with_names() {
        let descriptors = vec![
            ProcessorDescriptor::new("a").after("c"),
            ProcessorDescriptor::new("b").after("a"),
            ProcessorDescriptor::new("c").after("b"),
        ];
        match resolve_order(&descriptors) {
            Err(PackError::CyclicOrdering { processors }) => {
                assert_eq!(processors, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_relation_is_a_cycle() {
        let descriptors = vec![ProcessorDescriptor::new("a").after("a")];
        assert!(matches!(
            resolve_order(&descriptors),
            Err(PackError::CyclicOrdering { .. })
        ));
    }

    #[test]
    fn test_unknown_relation() {
        let descriptors = vec![ProcessorDescriptor::new("a").after("missing")];
        match resolve_order(&descriptors) {
            Err(PackError::UnresolvedOrdering { processor, target }) => {
                assert_eq!(processor, "a");
                assert_eq!(target, "missing");
            }
            other => panic!("expected unresolved ordering, got {other:?}"),
        }
    }
}
