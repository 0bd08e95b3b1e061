// ABOUTME: Stage dependency graph construction and cycle detection
// ABOUTME: Wraps a petgraph directed graph keyed by stage id with DFS cycle reporting

use petgraph::graph::NodeIndex;
use petgraph::{Direction, Graph};
use std::collections::HashMap;

use super::error::{Result, ValidationError};
use super::stage::{Stage, StageId};

/// Directed graph over stage ids. An edge `(from, to)` means `to` may only
/// start after `from` has fully settled.
pub struct DependencyGraph {
    graph: Graph<StageId, ()>,
    indices: HashMap<StageId, NodeIndex>,
}

/// Outcome of cycle detection. `members` lists the stage ids on the cycle
/// when one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub has_circular: bool,
    pub members: Vec<StageId>,
}

impl DependencyGraph {
    /// Build the graph from a stage list, rejecting references to unknown
    /// stage ids.
    pub fn from_stages(stages: &[Stage]) -> Result<Self> {
        let mut graph = Graph::new();
        let mut indices = HashMap::new();

        for stage in stages {
            let node = graph.add_node(stage.id);
            indices.insert(stage.id, node);
        }

        for stage in stages {
            let to = indices[&stage.id];
            for &dependency in &stage.depends_on {
                let from = *indices.get(&dependency).ok_or(
                    ValidationError::UnknownDependency {
                        stage: stage.id,
                        dependency,
                    },
                )?;
                graph.add_edge(from, to, ());
            }
        }

        Ok(Self { graph, indices })
    }

    /// Build from explicit nodes and edges. Used by validation callers that
    /// operate on raw graphs rather than built stage lists.
    pub fn from_edges(nodes: &[StageId], edges: &[(StageId, StageId)]) -> Self {
        let mut graph = Graph::new();
        let mut indices = HashMap::new();

        for &id in nodes {
            let node = graph.add_node(id);
            indices.insert(id, node);
        }
        for &(from, to) in edges {
            if let (Some(&a), Some(&b)) = (indices.get(&from), indices.get(&to)) {
                graph.add_edge(a, b, ());
            }
        }

        Self { graph, indices }
    }

    /// Depth-first cycle detection with an explicit recursion stack.
    ///
    /// Revisiting a node already on the stack reports the cycle's member
    /// stage ids (the stack suffix from that node on). Disconnected acyclic
    /// graphs report no cycle.
    pub fn detect_cycle(&self) -> CycleReport {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut stack: Vec<NodeIndex> = Vec::new();

        // Iterative DFS; the flag distinguishes entering a node from
        // unwinding past it.
        for start in self.graph.node_indices() {
            if marks[start.index()] != Mark::Unvisited {
                continue;
            }

            let mut work = vec![(start, false)];
            while let Some((node, exiting)) = work.pop() {
                if exiting {
                    marks[node.index()] = Mark::Done;
                    stack.pop();
                    continue;
                }
                if marks[node.index()] == Mark::Done {
                    continue;
                }
                if marks[node.index()] == Mark::OnStack {
                    continue;
                }

                marks[node.index()] = Mark::OnStack;
                stack.push(node);
                work.push((node, true));

                for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                    match marks[next.index()] {
                        Mark::OnStack => {
                            // Cycle: the stack suffix from `next` onward.
                            let position = stack
                                .iter()
                                .position(|&n| n == next)
                                .unwrap_or(0);
                            let mut members: Vec<StageId> = stack[position..]
                                .iter()
                                .map(|&n| self.graph[n])
                                .collect();
                            members.sort_unstable();
                            return CycleReport {
                                has_circular: true,
                                members,
                            };
                        }
                        Mark::Unvisited => work.push((next, false)),
                        Mark::Done => {}
                    }
                }
            }
        }

        CycleReport {
            has_circular: false,
            members: Vec::new(),
        }
    }

    /// Stage ids that transitively depend on the given stage.
    pub fn transitive_dependents(&self, stage_id: StageId) -> Vec<StageId> {
        let Some(&start) = self.indices.get(&stage_id) else {
            return Vec::new();
        };

        let mut visited = vec![false; self.graph.node_count()];
        let mut queue = vec![start];
        let mut dependents = Vec::new();

        while let Some(node) = queue.pop() {
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    dependents.push(self.graph[next]);
                    queue.push(next);
                }
            }
        }

        dependents.sort_unstable();
        dependents
    }

    pub fn contains(&self, stage_id: StageId) -> bool {
        self.indices.contains_key(&stage_id)
    }

    pub fn stage_count(&self) -> usize {
        self.indices.len()
    }
}
