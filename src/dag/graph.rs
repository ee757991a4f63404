// src/dag/graph.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{AssetdagError, Result};
use crate::types::{EdgeKind, Target, TaskId};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: tasks that must settle before this one can run.
    deps: Vec<(TaskId, EdgeKind)>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<(TaskId, EdgeKind)>,
}

/// The task plan for one invocation: nodes plus gated edges.
///
/// Built through [`TaskGraph::for_target`] or [`TaskGraph::from_edges`]; both
/// reject cycles.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: BTreeMap<TaskId, DagNode>,
}

impl TaskGraph {
    /// The plan the command line asked for.
    ///
    /// - a single task: that task alone
    /// - `build`: `clean` then `building`, gated on success
    /// - `default`: every asset class in parallel, then `watching` once all
    ///   of them settled
    pub fn for_target(target: Target) -> Result<Self> {
        match target {
            Target::Task(task) => Self::from_edges([task], []),
            Target::Build => Self::from_edges(
                [TaskId::Clean, TaskId::Building],
                [(TaskId::Clean, TaskId::Building, EdgeKind::OnSuccess)],
            ),
            Target::Default => {
                let mut nodes = TaskId::ASSET_CLASSES.to_vec();
                nodes.push(TaskId::Watching);
                let edges = TaskId::ASSET_CLASSES
                    .iter()
                    .map(|&class| (class, TaskId::Watching, EdgeKind::OnSettled));
                Self::from_edges(nodes, edges)
            }
        }
    }

    /// Build a graph from explicit nodes and `(from, to, kind)` edges.
    ///
    /// Edge endpoints missing from `nodes` are added.
    pub fn from_edges(
        nodes: impl IntoIterator<Item = TaskId>,
        edges: impl IntoIterator<Item = (TaskId, TaskId, EdgeKind)>,
    ) -> Result<Self> {
        let mut map: BTreeMap<TaskId, DagNode> = BTreeMap::new();
        for task in nodes {
            map.entry(task).or_default();
        }

        for (from, to, kind) in edges {
            if from == to {
                return Err(AssetdagError::DagCycle(format!(
                    "task '{from}' cannot depend on itself"
                )));
            }
            map.entry(from).or_default().dependents.push((to, kind));
            map.entry(to).or_default().deps.push((from, kind));
        }

        let graph = Self { nodes: map };
        graph.validate_acyclic()?;
        Ok(graph)
    }

    fn validate_acyclic(&self) -> Result<()> {
        let mut graph: DiGraphMap<TaskId, EdgeKind> = DiGraphMap::new();
        for (&task, node) in &self.nodes {
            graph.add_node(task);
            for &(to, kind) in &node.dependents {
                graph.add_edge(task, to, kind);
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(AssetdagError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Return all tasks, in `TaskId` order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.nodes.contains_key(&task)
    }

    /// Immediate dependencies of a task, with the gate of each edge.
    pub fn dependencies_of(&self, task: TaskId) -> &[(TaskId, EdgeKind)] {
        self.nodes
            .get(&task)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task, with the gate of each edge.
    pub fn dependents_of(&self, task: TaskId) -> &[(TaskId, EdgeKind)] {
        self.nodes
            .get(&task)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks without dependencies; triggering them pulls in the whole plan.
    pub fn roots(&self) -> Vec<TaskId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.deps.is_empty())
            .map(|(&task, _)| task)
            .collect()
    }

    /// Every edge as `(from, to, kind)`.
    pub fn edges(&self) -> Vec<(TaskId, TaskId, EdgeKind)> {
        self.nodes
            .iter()
            .flat_map(|(&from, node)| node.dependents.iter().map(move |&(to, kind)| (from, to, kind)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_task_target_has_no_edges() {
        let graph = TaskGraph::for_target(Target::Task(TaskId::Styles)).unwrap();
        assert_eq!(graph.tasks().collect::<Vec<_>>(), vec![TaskId::Styles]);
        assert!(graph.edges().is_empty());
        assert_eq!(graph.roots(), vec![TaskId::Styles]);
    }

    #[test]
    fn build_gates_building_on_clean_success() {
        let graph = TaskGraph::for_target(Target::Build).unwrap();
        assert_eq!(
            graph.edges(),
            vec![(TaskId::Clean, TaskId::Building, EdgeKind::OnSuccess)]
        );
        assert_eq!(graph.roots(), vec![TaskId::Clean]);
    }

    #[test]
    fn default_waits_for_every_asset_class_to_settle() {
        let graph = TaskGraph::for_target(Target::Default).unwrap();
        let deps = graph.dependencies_of(TaskId::Watching);
        assert_eq!(deps.len(), 6);
        assert!(deps.iter().all(|&(_, kind)| kind == EdgeKind::OnSettled));
        assert_eq!(graph.roots().len(), 6);
        assert!(!graph.roots().contains(&TaskId::Watching));
    }

    #[test]
    fn cycles_are_rejected() {
        let err = TaskGraph::from_edges(
            [],
            [
                (TaskId::Clean, TaskId::Building, EdgeKind::OnSuccess),
                (TaskId::Building, TaskId::Clean, EdgeKind::OnSuccess),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, AssetdagError::DagCycle(_)));
    }

    #[test]
    fn self_edges_are_rejected() {
        let err = TaskGraph::from_edges(
            [TaskId::Pages],
            [(TaskId::Pages, TaskId::Pages, EdgeKind::OnSettled)],
        )
        .unwrap_err();
        assert!(matches!(err, AssetdagError::DagCycle(_)));
    }
}
