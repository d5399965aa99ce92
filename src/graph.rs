//! Dependency graph over a batch of agent definitions.
//!
//! Edges point from an agent to the agents it references through
//! connected-agent tools. The graph is rebuilt per batch and never persisted.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::debug;

use crate::error::SyncError;
use crate::naming::normalize_alias;
use crate::types::{AgentDefinition, UNKNOWN_AGENT};

/// Extract connected-agent dependencies for each definition in the batch.
///
/// The dependency name comes from the explicit `name_from_id` field when
/// present; otherwise the tool alias is matched against the normalized names
/// of the batch definitions. References that name nothing in the batch are
/// external and excluded here (the upsert engine resolves them against the
/// remote catalog later).
pub fn extract_dependencies(
    definitions: &[AgentDefinition],
) -> HashMap<String, HashSet<String>> {
    let names: HashSet<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
    let mut by_alias: HashMap<String, &str> = HashMap::with_capacity(definitions.len());
    for def in definitions {
        by_alias.insert(normalize_alias(&def.name), def.name.as_str());
    }

    let mut dependencies: HashMap<String, HashSet<String>> = HashMap::new();
    for def in definitions {
        for tool in &def.tools {
            let Some(connected) = tool.as_connected_agent() else {
                continue;
            };
            let referenced = match &connected.connected_agent.name_from_id {
                Some(name) if name != UNKNOWN_AGENT => Some(name.as_str()),
                Some(_) => None,
                None => connected
                    .connected_agent
                    .name
                    .as_deref()
                    .and_then(|alias| by_alias.get(&normalize_alias(alias)).copied()),
            };
            let Some(referenced) = referenced else {
                continue;
            };
            if names.contains(referenced) {
                debug!("{} depends on {}", def.name, referenced);
                dependencies
                    .entry(def.name.clone())
                    .or_default()
                    .insert(referenced.to_string());
            } else {
                debug!(
                    "{} references '{}' outside the batch; deferring resolution",
                    def.name, referenced
                );
            }
        }
    }
    dependencies
}

/// Order definitions so every dependency precedes its dependents.
///
/// Cycles abort the batch with a [`SyncError::CyclicDependency`] listing the
/// cycle members. Definitions with no ordering constraint between them keep
/// their input relative order, so repeated runs are reproducible.
pub fn dependency_sort(
    definitions: &[AgentDefinition],
) -> Result<Vec<&AgentDefinition>, SyncError> {
    let index_of: HashMap<&str, usize> = definitions
        .iter()
        .enumerate()
        .map(|(i, d)| (d.name.as_str(), i))
        .collect();

    let dependencies = extract_dependencies(definitions);
    let mut deps: Vec<Vec<usize>> = vec![Vec::new(); definitions.len()];
    for (name, targets) in &dependencies {
        if let Some(&u) = index_of.get(name.as_str()) {
            for target in targets {
                if let Some(&v) = index_of.get(target.as_str()) {
                    deps[u].push(v);
                }
            }
        }
    }

    if let Some(cycle) = find_cycle(&deps) {
        let members: Vec<String> = cycle
            .iter()
            .map(|&i| definitions[i].name.clone())
            .collect();
        return Err(SyncError::CyclicDependency(members));
    }

    // Kahn's algorithm with a min-heap keyed by input index: among
    // simultaneously-ready definitions the original file order wins.
    let mut pending: Vec<usize> = deps.iter().map(|d| d.len()).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); definitions.len()];
    for (u, targets) in deps.iter().enumerate() {
        for &v in targets {
            dependents[v].push(u);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .enumerate()
        .filter(|(_, &count)| count == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(definitions.len());
    while let Some(Reverse(u)) = ready.pop() {
        order.push(&definitions[u]);
        for &w in &dependents[u] {
            pending[w] -= 1;
            if pending[w] == 0 {
                ready.push(Reverse(w));
            }
        }
    }

    if order.len() != definitions.len() {
        // Unreachable after find_cycle, kept as a guard for graph edits
        let stuck: Vec<String> = pending
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(i, _)| definitions[i].name.clone())
            .collect();
        return Err(SyncError::CyclicDependency(stuck));
    }
    Ok(order)
}

/// Select `root` plus everything it transitively depends on, preserving the
/// input relative order of the surviving definitions.
pub fn transitive_closure(
    root: &str,
    definitions: &[AgentDefinition],
) -> Result<Vec<AgentDefinition>, SyncError> {
    if !definitions.iter().any(|d| d.name == root) {
        return Err(SyncError::NotFound(root.to_string()));
    }
    let dependencies = extract_dependencies(definitions);
    let mut keep: HashSet<&str> = HashSet::new();
    let mut queue: Vec<&str> = vec![root];
    while let Some(name) = queue.pop() {
        if keep.insert(name) {
            if let Some(targets) = dependencies.get(name) {
                queue.extend(targets.iter().map(String::as_str));
            }
        }
    }
    Ok(definitions
        .iter()
        .filter(|d| keep.contains(d.name.as_str()))
        .cloned()
        .collect())
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Iterative three-color depth-first search. Returns the node indices of one
/// cycle when the graph is cyclic.
fn find_cycle(adjacency: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut mark = vec![Mark::Unvisited; adjacency.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start in 0..adjacency.len() {
        if mark[start] != Mark::Unvisited {
            continue;
        }
        mark[start] = Mark::InProgress;
        stack.push((start, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            if next < adjacency[node].len() {
                frame.1 += 1;
                let child = adjacency[node][next];
                match mark[child] {
                    Mark::Unvisited => {
                        mark[child] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                    Mark::InProgress => {
                        // The stack from `child` to `node` is the cycle
                        let from = stack
                            .iter()
                            .position(|&(n, _)| n == child)
                            .unwrap_or(0);
                        return Some(stack[from..].iter().map(|&(n, _)| n).collect());
                    }
                    Mark::Done => {}
                }
            } else {
                mark[node] = Mark::Done;
                stack.pop();
            }
        }
    }
    None
}
