//! In-memory [`SquareStore`], used by tests and demos.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};

use crate::engine::{ClaimId, ClaimRecord, Claimant, Grid, GridId, NewGrid, ScoreRecord};
use crate::grid::{Position, Quarter, SealedAxes};
use crate::store::{SquareStore, StoreError, UnitOfWork};

/// Store that keeps everything in process memory.
///
/// A transaction works on a copy of the state and swaps it in only when the
/// closure succeeds, so failed units of work leave nothing behind.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_grid_id: GridId,
    next_claim_id: ClaimId,
    grids: BTreeMap<GridId, Grid>,
    claims: Vec<ClaimRecord>,
    cells: HashMap<(GridId, Position), ClaimId>,
    scores: BTreeMap<(GridId, Quarter), ScoreRecord>,
}

impl SquareStore for MemoryStore {
    #[instrument(skip_all)]
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))?;
        let mut working = guard.clone();
        let value = f(&mut working)?;
        *guard = working;
        debug!("Memory transaction committed");
        Ok(value)
    }
}

impl UnitOfWork for MemoryState {
    fn create_grid(&mut self, grid: &NewGrid) -> Result<Grid, StoreError> {
        if self.grids.values().any(|g| g.name() == grid.name()) {
            return Err(StoreError::UniqueViolation);
        }
        self.next_grid_id += 1;
        let created = Grid::from_parts(self.next_grid_id, grid.clone(), None);
        self.grids.insert(*created.id(), created.clone());
        Ok(created)
    }

    fn grid(&mut self, grid_id: GridId) -> Result<Option<Grid>, StoreError> {
        Ok(self.grids.get(&grid_id).cloned())
    }

    fn grids(&mut self) -> Result<Vec<Grid>, StoreError> {
        Ok(self.grids.values().cloned().collect())
    }

    fn reserved_count(&mut self, grid_id: GridId) -> Result<usize, StoreError> {
        Ok(self.cells.keys().filter(|(g, _)| *g == grid_id).count())
    }

    fn taken_among(
        &mut self,
        grid_id: GridId,
        positions: &[Position],
    ) -> Result<Vec<Position>, StoreError> {
        Ok(positions
            .iter()
            .copied()
            .filter(|p| self.cells.contains_key(&(grid_id, *p)))
            .collect())
    }

    fn insert_claim(
        &mut self,
        grid_id: GridId,
        claimant: &Claimant,
        positions: &[Position],
    ) -> Result<ClaimId, StoreError> {
        if !self.grids.contains_key(&grid_id) {
            return Err(StoreError::Backend(format!("grid {} does not exist", grid_id)));
        }
        let claim_id = self.next_claim_id + 1;
        for position in positions {
            if self.cells.insert((grid_id, *position), claim_id).is_some() {
                return Err(StoreError::UniqueViolation);
            }
        }
        self.next_claim_id = claim_id;
        self.claims.push(ClaimRecord::new(
            claim_id,
            grid_id,
            claimant.clone(),
            positions.to_vec(),
        ));
        Ok(claim_id)
    }

    fn seal(&mut self, grid_id: GridId, axes: &SealedAxes) -> Result<(), StoreError> {
        match self.grids.get_mut(&grid_id) {
            Some(grid) if !grid.is_sealed() => {
                grid.seal(axes.clone());
                Ok(())
            }
            Some(_) => Err(StoreError::Backend(format!("grid {} is already sealed", grid_id))),
            None => Err(StoreError::Backend(format!("grid {} does not exist", grid_id))),
        }
    }

    fn claims(&mut self, grid_id: GridId) -> Result<Vec<ClaimRecord>, StoreError> {
        Ok(self
            .claims
            .iter()
            .filter(|c| *c.grid_id() == grid_id)
            .cloned()
            .collect())
    }

    fn upsert_score(&mut self, grid_id: GridId, score: &ScoreRecord) -> Result<(), StoreError> {
        self.scores.insert((grid_id, *score.quarter()), *score);
        Ok(())
    }

    fn delete_score(&mut self, grid_id: GridId, quarter: Quarter) -> Result<bool, StoreError> {
        Ok(self.scores.remove(&(grid_id, quarter)).is_some())
    }

    fn scores(&mut self, grid_id: GridId) -> Result<Vec<ScoreRecord>, StoreError> {
        Ok(self
            .scores
            .range((grid_id, Quarter::First)..=(grid_id, Quarter::Fourth))
            .map(|(_, score)| *score)
            .collect())
    }
}
