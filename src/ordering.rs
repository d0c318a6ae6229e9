use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::model::Job;

/// Display order for a pipeline's jobs.
#[derive(Debug)]
pub struct JobOrder {
    /// Every input job exactly once, predecessors before successors
    pub jobs: Vec<Job>,
    /// Names of jobs caught in a dependency cycle, appended at the end of `jobs`
    pub unresolved: Vec<String>,
}

/// Orders jobs so every job follows the dependencies it names.
///
/// Jobs are placed in rounds: a job becomes placeable once each of its
/// dependencies was placed in an earlier round, and receives that round as its
/// depth. Dependencies naming jobs outside the set are ignored. Within a depth
/// the input order is kept.
///
/// Jobs that something depends on, or that sit deeper than the first round,
/// come first by ascending depth. Standalone depth-0 jobs follow. Jobs left
/// over when a round places nothing form a cycle and are appended last in
/// input order.
pub fn order_jobs(jobs: Vec<Job>) -> JobOrder {
    let graph = dependency_graph(&jobs);

    let mut depths: Vec<Option<usize>> = vec![None; jobs.len()];
    let mut placed: Vec<(usize, NodeIndex)> = Vec::with_capacity(jobs.len());
    let mut remaining: Vec<NodeIndex> = graph.node_indices().collect();

    for round in 0..jobs.len() {
        if remaining.is_empty() {
            break;
        }

        let (ready, blocked): (Vec<NodeIndex>, Vec<NodeIndex>) =
            remaining.into_iter().partition(|&node| {
                graph
                    .neighbors_directed(node, Direction::Incoming)
                    .all(|dep| depths[dep.index()].is_some())
            });

        if ready.is_empty() {
            remaining = blocked;
            break;
        }

        // Assigned after the scan so jobs in one round never unlock each other.
        for &node in &ready {
            depths[node.index()] = Some(round);
            placed.push((round, node));
        }

        remaining = blocked;
    }

    let unresolved: Vec<String> = remaining
        .iter()
        .map(|node| jobs[node.index()].name.clone())
        .collect();

    // `placed` is already grouped by ascending depth, input order within each.
    let (anchored, standalone): (Vec<_>, Vec<_>) =
        placed.into_iter().partition(|&(depth, node)| {
            depth > 0
                || graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .next()
                    .is_some()
        });

    let sequence: Vec<usize> = anchored
        .into_iter()
        .chain(standalone)
        .map(|(_, node)| node)
        .chain(remaining)
        .map(NodeIndex::index)
        .collect();

    let mut slots: Vec<Option<Job>> = jobs.into_iter().map(Some).collect();
    let jobs = sequence
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect();

    JobOrder { jobs, unresolved }
}

/// One node per job, in input order, with an edge from each dependency to its dependent.
///
/// Dependencies naming jobs outside the set get no edge.
fn dependency_graph(jobs: &[Job]) -> DiGraph<(), ()> {
    let mut graph = DiGraph::with_capacity(jobs.len(), jobs.len());
    let name_to_index: HashMap<&str, NodeIndex> = jobs
        .iter()
        .map(|job| (job.name.as_str(), graph.add_node(())))
        .collect();

    for (idx, job) in jobs.iter().enumerate() {
        for dep in &job.dependency_names {
            if let Some(&dep_idx) = name_to_index.get(dep.as_str()) {
                graph.update_edge(dep_idx, NodeIndex::new(idx), ());
            }
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str, deps: &[&str]) -> Job {
        Job::new(name).depends_on(deps.iter().copied())
    }

    fn names(order: &JobOrder) -> Vec<&str> {
        order.jobs.iter().map(|j| j.name.as_str()).collect()
    }

    fn position(order: &JobOrder, name: &str) -> usize {
        order.jobs.iter().position(|j| j.name == name).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_order() {
        let order = order_jobs(vec![]);
        assert!(order.jobs.is_empty());
        assert!(order.unresolved.is_empty());
    }

    #[test]
    fn linear_chain_is_ordered_regardless_of_input_order() {
        let order = order_jobs(vec![
            job("deploy", &["test"]),
            job("test", &["build"]),
            job("build", &[]),
        ]);
        assert_eq!(names(&order), ["build", "test", "deploy"]);
        assert!(order.unresolved.is_empty());
    }

    #[test]
    fn standalone_roots_go_after_dependency_chains() {
        let order = order_jobs(vec![
            job("lint", &[]),
            job("build", &[]),
            job("deploy", &["build"]),
            job("docs", &[]),
        ]);
        assert_eq!(names(&order), ["build", "deploy", "lint", "docs"]);
    }

    #[test]
    fn input_order_is_kept_within_a_depth() {
        let order = order_jobs(vec![
            job("b-test", &["build"]),
            job("a-test", &["build"]),
            job("build", &[]),
        ]);
        assert_eq!(names(&order), ["build", "b-test", "a-test"]);
    }

    #[test]
    fn dangling_dependencies_are_ignored() {
        let order = order_jobs(vec![job("deploy", &["elsewhere"]), job("build", &[])]);
        assert_eq!(order.jobs.len(), 2);
        assert!(order.unresolved.is_empty());
        // deploy has no resolvable parents and no children, so it is a standalone root
        assert_eq!(names(&order), ["deploy", "build"]);
    }

    #[test]
    fn two_cycle_keeps_every_job() {
        let order = order_jobs(vec![job("a", &["b"]), job("b", &["a"]), job("c", &[])]);
        assert_eq!(order.jobs.len(), 3);
        assert_eq!(names(&order), ["c", "a", "b"]);
        assert_eq!(order.unresolved, ["a", "b"]);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let order = order_jobs(vec![job("loop", &["loop"])]);
        assert_eq!(names(&order), ["loop"]);
        assert_eq!(order.unresolved, ["loop"]);
    }

    #[test]
    fn jobs_downstream_of_a_cycle_stay_unresolved() {
        let order = order_jobs(vec![
            job("a", &["b"]),
            job("b", &["a"]),
            job("after", &["a"]),
            job("root", &[]),
        ]);
        assert_eq!(order.jobs.len(), 4);
        assert_eq!(order.unresolved, ["a", "b", "after"]);
    }

    #[test]
    fn diamond_respects_every_edge() {
        let order = order_jobs(vec![
            job("ship", &["left", "right"]),
            job("right", &["root"]),
            job("left", &["root"]),
            job("root", &[]),
        ]);
        assert_eq!(names(&order), ["root", "right", "left", "ship"]);
    }

    #[test]
    fn every_dependency_precedes_its_dependent() {
        let jobs = vec![
            job("e", &["d", "b"]),
            job("d", &["c"]),
            job("c", &["a"]),
            job("b", &["a"]),
            job("a", &[]),
            job("x", &[]),
            job("y", &["x", "missing"]),
        ];
        let edges: Vec<(String, String)> = jobs
            .iter()
            .flat_map(|j| {
                j.dependency_names
                    .iter()
                    .map(move |d| (d.clone(), j.name.clone()))
            })
            .collect();

        let order = order_jobs(jobs);
        assert_eq!(order.jobs.len(), 7);
        for (dep, dependent) in edges {
            if dep == "missing" {
                continue;
            }
            assert!(
                position(&order, &dep) < position(&order, &dependent),
                "{dep} should precede {dependent}"
            );
        }
    }

    #[test]
    fn ordering_is_deterministic() {
        let build = || {
            vec![
                job("p", &["q"]),
                job("q", &[]),
                job("r", &[]),
                job("s", &["q"]),
            ]
        };
        let first = names(&order_jobs(build())).join(",");
        let second = names(&order_jobs(build())).join(",");
        assert_eq!(first, second);
    }

    #[test]
    fn graph_links_dependencies_to_dependents() {
        let jobs = vec![job("build", &[]), job("deploy", &["build", "elsewhere"])];
        let graph = dependency_graph(&jobs);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let upstream: Vec<usize> = graph
            .neighbors_directed(NodeIndex::new(1), Direction::Incoming)
            .map(NodeIndex::index)
            .collect();
        assert_eq!(upstream, [0]);
    }
}
