//! SQLite-backed [`SquareStore`].

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use tracing::{debug, info, instrument};

use crate::db::models::{
    CellRow, ClaimRow, GridRow, NewCellRow, NewClaimRow, NewGridRow, NewScoreRow, ScoreRow,
};
use crate::db::{DbError, MIGRATIONS, schema};
use crate::engine::{ClaimId, ClaimRecord, Claimant, Grid, GridId, NewGrid, ScoreRecord};
use crate::grid::{Position, Quarter, SealedAxes};
use crate::store::{SquareStore, StoreError, UnitOfWork};

/// Default time a connection waits for the write lock, in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

/// Database repository for grids, claims and scores.
///
/// Each unit of work opens its own connection and runs under
/// `BEGIN IMMEDIATE`, which takes the database write lock before the first
/// read. Concurrent claims from any number of threads or processes are
/// therefore serialized by SQLite itself, and the `(grid_id, position)`
/// unique index rejects any overlapping cell.
#[derive(Debug, Clone)]
pub struct GridRepository {
    db_path: String,
    busy_timeout_ms: u32,
}

impl GridRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        Self::with_busy_timeout(db_path, DEFAULT_BUSY_TIMEOUT_MS)
    }

    /// Creates a repository with an explicit lock wait.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn with_busy_timeout(db_path: String, busy_timeout_ms: u32) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, busy_timeout_ms, "Creating GridRepository");
        Ok(Self {
            db_path,
            busy_timeout_ms,
        })
    }

    /// Path of the database file.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))?;
        Ok(conn)
    }

    /// Applies pending schema migrations and switches the database to WAL.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        conn.batch_execute("PRAGMA journal_mode = WAL;")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migrations failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(())
    }
}

impl SquareStore for GridRepository {
    #[instrument(skip_all, fields(db_path = %self.db_path))]
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut conn = self.connection().map_err(StoreError::from)?;
        conn.immediate_transaction(|conn| {
            let mut uow = SqliteUnitOfWork { conn };
            f(&mut uow).map_err(TxAbort::Caller)
        })
        .map_err(|abort| match abort {
            TxAbort::Caller(e) => e,
            TxAbort::Diesel(e) => E::from(StoreError::from(e)),
        })
    }
}

/// Why a SQLite transaction rolled back: the caller's closure failed, or
/// diesel failed to begin or commit.
enum TxAbort<E> {
    Caller(E),
    Diesel(diesel::result::Error),
}

impl<E> From<diesel::result::Error> for TxAbort<E> {
    fn from(err: diesel::result::Error) -> Self {
        Self::Diesel(err)
    }
}

/// Unit of work bound to one open SQLite transaction.
struct SqliteUnitOfWork<'a> {
    conn: &'a mut SqliteConnection,
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
    fn create_grid(&mut self, grid: &NewGrid) -> Result<Grid, StoreError> {
        let row = NewGridRow::try_from(grid)?;
        let created = diesel::insert_into(schema::grids::table)
            .values(&row)
            .returning(GridRow::as_returning())
            .get_result(self.conn)?;
        Ok(created.into_grid()?)
    }

    fn grid(&mut self, grid_id: GridId) -> Result<Option<Grid>, StoreError> {
        let row = schema::grids::table
            .find(grid_id)
            .select(GridRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(GridRow::into_grid).transpose()?)
    }

    fn grids(&mut self) -> Result<Vec<Grid>, StoreError> {
        let rows = schema::grids::table
            .order(schema::grids::id.asc())
            .select(GridRow::as_select())
            .load(self.conn)?;
        Ok(rows
            .into_iter()
            .map(GridRow::into_grid)
            .collect::<Result<Vec<_>, _>>()?)
    }

    fn reserved_count(&mut self, grid_id: GridId) -> Result<usize, StoreError> {
        let count: i64 = schema::cells::table
            .filter(schema::cells::grid_id.eq(grid_id))
            .count()
            .get_result(self.conn)?;
        Ok(count as usize)
    }

    fn taken_among(
        &mut self,
        grid_id: GridId,
        positions: &[Position],
    ) -> Result<Vec<Position>, StoreError> {
        let wanted: Vec<i32> = positions.iter().map(|p| i32::from(*p)).collect();
        let taken: Vec<i32> = schema::cells::table
            .filter(schema::cells::grid_id.eq(grid_id))
            .filter(schema::cells::position.eq_any(wanted))
            .select(schema::cells::position)
            .order(schema::cells::position.asc())
            .load(self.conn)?;
        taken
            .into_iter()
            .map(|p| Position::new(i64::from(p)).map_err(|e| StoreError::Backend(e.to_string())))
            .collect()
    }

    fn insert_claim(
        &mut self,
        grid_id: GridId,
        claimant: &Claimant,
        positions: &[Position],
    ) -> Result<ClaimId, StoreError> {
        let claim = NewClaimRow::new(
            grid_id,
            claimant.display_name().clone(),
            claimant.email().clone(),
            claimant.phone().clone(),
        );
        let claim_id: i32 = diesel::insert_into(schema::claims::table)
            .values(&claim)
            .returning(schema::claims::id)
            .get_result(self.conn)?;

        let cells: Vec<NewCellRow> = positions
            .iter()
            .map(|p| NewCellRow::new(grid_id, claim_id, i32::from(*p)))
            .collect();
        diesel::insert_into(schema::cells::table)
            .values(&cells)
            .execute(self.conn)?;

        debug!(claim_id, cells = cells.len(), "Claim rows inserted");
        Ok(claim_id)
    }

    fn seal(&mut self, grid_id: GridId, axes: &SealedAxes) -> Result<(), StoreError> {
        let updated = diesel::update(
            schema::grids::table
                .find(grid_id)
                .filter(schema::grids::sealed.eq(false)),
        )
        .set((
            schema::grids::sealed.eq(true),
            schema::grids::x_axis.eq(Some(axes.x().to_string())),
            schema::grids::y_axis.eq(Some(axes.y().to_string())),
            schema::grids::updated_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .execute(self.conn)?;
        if updated != 1 {
            return Err(StoreError::Backend(format!(
                "Grid {} was not open for sealing",
                grid_id
            )));
        }
        Ok(())
    }

    fn claims(&mut self, grid_id: GridId) -> Result<Vec<ClaimRecord>, StoreError> {
        let claims: Vec<ClaimRow> = schema::claims::table
            .filter(schema::claims::grid_id.eq(grid_id))
            .order(schema::claims::id.asc())
            .select(ClaimRow::as_select())
            .load(self.conn)?;
        let cells: Vec<CellRow> = CellRow::belonging_to(&claims)
            .order(schema::cells::position.asc())
            .select(CellRow::as_select())
            .load(self.conn)?;

        cells
            .grouped_by(&claims)
            .into_iter()
            .zip(claims)
            .map(|(cells, claim)| -> Result<ClaimRecord, StoreError> {
                let positions = cells
                    .iter()
                    .map(|cell| Position::new(i64::from(*cell.position())))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                let claimant = Claimant::new(
                    claim.display_name().clone(),
                    claim.email().clone(),
                    claim.phone().clone(),
                );
                Ok(ClaimRecord::new(*claim.id(), *claim.grid_id(), claimant, positions))
            })
            .collect()
    }

    fn upsert_score(&mut self, grid_id: GridId, score: &ScoreRecord) -> Result<(), StoreError> {
        let row = NewScoreRow::from_record(grid_id, score)?;
        diesel::insert_into(schema::scores::table)
            .values(&row)
            .on_conflict((schema::scores::grid_id, schema::scores::quarter))
            .do_update()
            .set((
                schema::scores::x_score.eq(row.x_score()),
                schema::scores::y_score.eq(row.y_score()),
                schema::scores::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    fn delete_score(&mut self, grid_id: GridId, quarter: Quarter) -> Result<bool, StoreError> {
        let deleted = diesel::delete(
            schema::scores::table
                .filter(schema::scores::grid_id.eq(grid_id))
                .filter(schema::scores::quarter.eq(i32::from(quarter.number()))),
        )
        .execute(self.conn)?;
        Ok(deleted > 0)
    }

    fn scores(&mut self, grid_id: GridId) -> Result<Vec<ScoreRecord>, StoreError> {
        let rows: Vec<ScoreRow> = schema::scores::table
            .filter(schema::scores::grid_id.eq(grid_id))
            .order(schema::scores::quarter.asc())
            .select(ScoreRow::as_select())
            .load(self.conn)?;
        rows.iter()
            .map(|row| row.to_record().map_err(StoreError::from))
            .collect()
    }
}
