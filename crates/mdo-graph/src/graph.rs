//! The producer→consumer module graph.

use mdo_model::Model;

/// Directed graph over modules: an edge p→c exists when some variable
/// produced by p is consumed by c. Edges are keyed by shared variables in
/// the registry; here only the module-level adjacency is kept, deduplicated
/// and sorted for deterministic traversal.
///
/// Built once per problem instance and immutable thereafter.
#[derive(Debug, Clone)]
pub struct DepGraph {
    succ: Vec<Vec<usize>>,
}

impl DepGraph {
    pub fn from_model(model: &Model) -> Self {
        let mut succ = vec![Vec::new(); model.n_modules()];
        for var in model.vars() {
            if let Some(p) = var.producer {
                for &c in &var.consumers {
                    succ[p.index() as usize].push(c.index() as usize);
                }
            }
        }
        for list in &mut succ {
            list.sort_unstable();
            list.dedup();
        }
        Self { succ }
    }

    pub fn n_modules(&self) -> usize {
        self.succ.len()
    }

    /// Consumer modules downstream of module `m`.
    pub fn successors(&self, m: usize) -> &[usize] {
        &self.succ[m]
    }

    /// True if module `m` consumes one of its own outputs.
    pub fn has_self_loop(&self, m: usize) -> bool {
        self.succ[m].binary_search(&m).is_ok()
    }

    pub(crate) fn adjacency(&self) -> &[Vec<usize>] {
        &self.succ
    }
}
