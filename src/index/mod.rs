//! Secondary-index collaborator seam
//!
//! Index implementations (dictionary, range, spatial, fulltext) live
//! outside the engine core. The engine only knows this registry: named
//! index plugins it can create, look up, delete, and ask to persist
//! themselves as opaque payloads alongside a graph save.

use crate::graph::{ElementId, PropertyValue};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::{Arc, RwLock};

/// A secondary index plugin. Implementations maintain their own structures
/// from the notifications below and serialize themselves opaquely.
pub trait GraphIndex: Send + Sync {
    /// Plugin-type name recorded in the save manifest (e.g. "dictionary").
    fn plugin_kind(&self) -> &'static str;

    /// An element's property changed or appeared.
    fn on_property_set(&self, element_id: ElementId, value: &PropertyValue);

    /// An element left the graph.
    fn on_element_removed(&self, element_id: ElementId);

    /// Write the plugin-specific payload.
    fn save(&self, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Restore the plugin-specific payload.
    fn load(&self, reader: &mut dyn Read) -> std::io::Result<()>;
}

/// Name-keyed registry of index plugins.
#[derive(Default)]
pub struct IndexRegistry {
    indexes: RwLock<HashMap<String, Arc<dyn GraphIndex>>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        IndexRegistry {
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Register an index under `name`. Returns `false` when the name is
    /// already taken.
    pub fn create_index(&self, name: impl Into<String>, index: Arc<dyn GraphIndex>) -> bool {
        let mut indexes = self.indexes.write().unwrap();
        match indexes.entry(name.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(index);
                true
            }
        }
    }

    pub fn get_index(&self, name: &str) -> Option<Arc<dyn GraphIndex>> {
        self.indexes.read().unwrap().get(name).cloned()
    }

    pub fn delete_index(&self, name: &str) -> bool {
        self.indexes.write().unwrap().remove(name).is_some()
    }

    /// Registered names with their plugin kinds, for the save manifest.
    pub fn describe(&self) -> Vec<(String, &'static str)> {
        self.indexes
            .read()
            .unwrap()
            .iter()
            .map(|(name, index)| (name.clone(), index.plugin_kind()))
            .collect()
    }
}
