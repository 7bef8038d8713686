//! Path-algorithm collaborator seam
//!
//! Shortest-path implementations are plugins resolved by name; the engine
//! core only carries the registry and the trait they implement.

use crate::engine::{GraphEngine, GraphResult};
use crate::graph::ElementId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A path-finding plugin operating on the engine's gate-protected read
/// surface.
pub trait PathAlgorithm: Send + Sync {
    /// Name the algorithm is resolved by (e.g. "bls").
    fn name(&self) -> &'static str;

    /// Find a path from `source` to `target` as a sequence of element ids,
    /// or `None` when no path exists.
    fn find_path(
        &self,
        engine: &GraphEngine,
        source: ElementId,
        target: ElementId,
        max_depth: u32,
    ) -> GraphResult<Option<Vec<ElementId>>>;
}

/// Name-keyed registry of path algorithms.
#[derive(Default)]
pub struct AlgorithmRegistry {
    algorithms: RwLock<HashMap<String, Arc<dyn PathAlgorithm>>>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        AlgorithmRegistry {
            algorithms: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, algorithm: Arc<dyn PathAlgorithm>) {
        self.algorithms
            .write()
            .unwrap()
            .insert(algorithm.name().to_string(), algorithm);
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn PathAlgorithm>> {
        self.algorithms.read().unwrap().get(name).cloned()
    }
}
