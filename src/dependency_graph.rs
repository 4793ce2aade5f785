use crate::{Transaction, Utxo};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

/// Dependencies between the members of one batch, indexed by batch position.
///
/// A candidate depends on another candidate if any of its inputs spends an output created by
/// the other one. Positions are used instead of transaction ids because the same transaction
/// may be submitted more than once.
pub struct DependencyGraph {
    // Positions of the candidates spending outputs of the candidate at the given position.
    dependents: Vec<Vec<usize>>,
    // Number of distinct candidates the candidate at the given position spends from.
    dependency_counts: Vec<usize>,
}

impl DependencyGraph {
    pub fn build(candidates: &[Transaction]) -> Self {
        // Every output created within the batch, mapped to the positions creating it.
        let mut creators: HashMap<Utxo, Vec<usize>> = HashMap::new();
        for (position, candidate) in candidates.iter().enumerate() {
            for (utxo, _) in candidate.created_utxos() {
                creators.entry(utxo).or_default().push(position);
            }
        }

        let mut dependents = vec![vec![]; candidates.len()];
        let mut dependency_counts = vec![0; candidates.len()];
        for (position, candidate) in candidates.iter().enumerate() {
            // All inputs are considered, not only the first one.
            let parents = candidate
                .spent_utxos()
                .filter_map(|utxo| creators.get(utxo))
                .flatten()
                .copied()
                .filter(|parent| *parent != position)
                .collect::<BTreeSet<usize>>();
            dependency_counts[position] = parents.len();
            for parent in parents {
                dependents[parent].push(position);
            }
        }

        Self {
            dependents,
            dependency_counts,
        }
    }

    pub fn len(&self) -> usize {
        self.dependency_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependency_counts.is_empty()
    }

    /// Positions of the candidates that spend outputs of the candidate at `position`.
    pub fn dependents(&self, position: usize) -> &[usize] {
        &self.dependents[position]
    }

    /// Number of batch members the candidate at `position` spends from.
    pub fn dependency_count(&self, position: usize) -> usize {
        self.dependency_counts[position]
    }

    /// Returns every position exactly once, each after all the positions it depends on.
    /// Among candidates whose dependencies are all processed, the lowest batch position goes
    /// first.
    pub fn topological_order(&self) -> Vec<usize> {
        self.topological_order_by_key(|_| ())
    }

    /// Like `topological_order`, but among ready candidates the one with the smallest key goes
    /// first; equal keys fall back to the batch position.
    ///
    /// Members of a dependency cycle are never ready. They are appended in batch order after
    /// everything else.
    pub fn topological_order_by_key<K, F>(&self, key: F) -> Vec<usize>
    where
        K: Ord,
        F: Fn(usize) -> K,
    {
        let mut remaining = self.dependency_counts.clone();
        let mut ready = BinaryHeap::new();
        for (position, count) in remaining.iter().enumerate() {
            if *count == 0 {
                ready.push(Reverse((key(position), position)));
            }
        }

        let mut order = Vec::with_capacity(self.len());
        let mut visited = vec![false; self.len()];
        while let Some(Reverse((_, position))) = ready.pop() {
            order.push(position);
            visited[position] = true;
            for dependent in &self.dependents[position] {
                remaining[*dependent] -= 1;
                if remaining[*dependent] == 0 {
                    ready.push(Reverse((key(*dependent), *dependent)));
                }
            }
        }

        if order.len() < self.len() {
            order.extend((0..self.len()).filter(|position| !visited[*position]));
        }
        order
    }

    #[cfg(test)]
    fn from_edges(len: usize, edges: &[(usize, usize)]) -> Self {
        let mut dependents = vec![vec![]; len];
        let mut dependency_counts = vec![0; len];
        for (parent, child) in edges {
            dependents[*parent].push(*child);
            dependency_counts[*child] += 1;
        }
        Self {
            dependents,
            dependency_counts,
        }
    }
}
