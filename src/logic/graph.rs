//! Priority-aware topological sort.
//!
//! Kahn's algorithm over dense node indices, with a min-heap of caller-supplied
//! priorities so that among all nodes ready at a given moment the smallest
//! priority is emitted first. This turns "any valid order" into exactly one
//! deterministic order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Directed graph where an edge `a -> b` means `a` must come before `b`.
#[derive(Debug, Clone)]
pub struct DependencyGraph<P: Ord + Copy> {
    priorities: Vec<P>,
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl<P: Ord + Copy> Default for DependencyGraph<P> {
    fn default() -> Self {
        Self {
            priorities: Vec::new(),
            successors: Vec::new(),
            in_degree: Vec::new(),
        }
    }
}

impl<P: Ord + Copy> DependencyGraph<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its index.
    pub fn add_node(&mut self, priority: P) -> usize {
        self.priorities.push(priority);
        self.successors.push(Vec::new());
        self.in_degree.push(0);
        self.priorities.len() - 1
    }

    /// Record that `before` must precede `after`. Parallel edges are ignored.
    pub fn add_edge(&mut self, before: usize, after: usize) {
        if self.successors[before].contains(&after) {
            return;
        }
        self.successors[before].push(after);
        self.in_degree[after] += 1;
    }

    pub fn len(&self) -> usize {
        self.priorities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty()
    }

    /// Sort the graph.
    ///
    /// On success returns every node index exactly once. On failure returns
    /// the nodes that sit on a cycle (nodes merely downstream of a cycle are
    /// pruned from the report).
    pub fn sort(&self) -> Result<Vec<usize>, Vec<usize>> {
        let mut in_degree = self.in_degree.clone();
        let mut ready: BinaryHeap<Reverse<(P, usize)>> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, deg)| *deg == 0)
            .map(|(node, _)| Reverse((self.priorities[node], node)))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(Reverse((_, node))) = ready.pop() {
            order.push(node);
            for &next in &self.successors[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse((self.priorities[next], next)));
                }
            }
        }

        if order.len() == self.len() {
            return Ok(order);
        }

        Err(self.cycle_members(&in_degree))
    }

    /// Strip nodes that only hang off a cycle: repeatedly drop remaining
    /// nodes with no remaining successor.
    fn cycle_members(&self, in_degree: &[usize]) -> Vec<usize> {
        let mut remaining: Vec<bool> = in_degree.iter().map(|&deg| deg > 0).collect();
        loop {
            let mut changed = false;
            for node in 0..self.len() {
                if remaining[node] && !self.successors[node].iter().any(|&s| remaining[s]) {
                    remaining[node] = false;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        (0..self.len()).filter(|&node| remaining[node]).collect()
    }
}
