//! Space catalog client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::SpaceId;
use domain::Space;

use crate::error::ClientError;

/// Trait for space catalog operations consumed by the orchestrator.
///
/// The catalog is a field-level mutator: it enforces no cross-entity
/// invariants. Availability is only written by the orchestrator's commit
/// step and the reconciliation pass.
#[async_trait]
pub trait SpaceCatalog: Send + Sync {
    /// Fetches a space by id.
    async fn get(&self, space_id: SpaceId) -> Result<Option<Space>, ClientError>;

    /// Lists all spaces in the catalog.
    async fn list(&self) -> Result<Vec<Space>, ClientError>;

    /// Reads the availability flag for a space.
    async fn get_availability(&self, space_id: SpaceId) -> Result<bool, ClientError>;

    /// Writes the availability flag for a space.
    async fn set_availability(&self, space_id: SpaceId, available: bool)
    -> Result<(), ClientError>;
}

#[derive(Debug, Default)]
struct CatalogState {
    spaces: HashMap<SpaceId, Space>,
    fail_next_set_availability: u32,
    availability_writes: u64,
}

/// In-memory space catalog for tests and demo wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemorySpaceCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemorySpaceCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a space record.
    pub fn insert(&self, space: Space) {
        self.state.write().unwrap().spaces.insert(space.id, space);
    }

    /// Makes the next `count` availability writes fail with a transport error.
    pub fn fail_next_set_availability(&self, count: u32) {
        self.state.write().unwrap().fail_next_set_availability = count;
    }

    /// Returns how many availability writes have succeeded.
    pub fn availability_write_count(&self) -> u64 {
        self.state.read().unwrap().availability_writes
    }
}

#[async_trait]
impl SpaceCatalog for InMemorySpaceCatalog {
    async fn get(&self, space_id: SpaceId) -> Result<Option<Space>, ClientError> {
        Ok(self.state.read().unwrap().spaces.get(&space_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Space>, ClientError> {
        Ok(self.state.read().unwrap().spaces.values().cloned().collect())
    }

    async fn get_availability(&self, space_id: SpaceId) -> Result<bool, ClientError> {
        self.state
            .read()
            .unwrap()
            .spaces
            .get(&space_id)
            .map(|s| s.available)
            .ok_or_else(|| ClientError::NotFound(format!("space {space_id}")))
    }

    async fn set_availability(
        &self,
        space_id: SpaceId,
        available: bool,
    ) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap();

        if state.fail_next_set_availability > 0 {
            state.fail_next_set_availability -= 1;
            return Err(ClientError::Transport(
                "availability endpoint unreachable".to_string(),
            ));
        }

        let space = state
            .spaces
            .get_mut(&space_id)
            .ok_or_else(|| ClientError::NotFound(format!("space {space_id}")))?;
        space.available = available;
        state.availability_writes += 1;
        Ok(())
    }
}
