use anyhow::Result;

use super::{SnapshotSink, SnapshotStore};
use crate::observation::Observation;

/// A [`SnapshotStore`] backed by an in-memory `Vec`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    observations: Vec<Observation>,
}

impl MemoryStore {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn all_observations(&self) -> Result<Vec<Observation>> {
        Ok(self.observations.clone())
    }
}

impl SnapshotSink for MemoryStore {
    fn append(&mut self, batch: &[Observation]) -> Result<()> {
        self.observations.extend_from_slice(batch);
        Ok(())
    }
}
