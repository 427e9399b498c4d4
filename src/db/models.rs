//! Database row models and their conversion to domain records.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::engine::{Grid, NewGrid, ScoreRecord};
use crate::grid::{AxisNumbers, Payouts, Quarter, SealedAxes};

/// Grid row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::grids)]
pub struct GridRow {
    id: i32,
    name: String,
    x_label: String,
    y_label: String,
    price_cents: i32,
    payouts: String,
    sealed: bool,
    x_axis: Option<String>,
    y_axis: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl GridRow {
    /// Converts the stored row into a [`Grid`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored payouts or axes are malformed, or if
    /// the sealed flag disagrees with the presence of axes.
    #[instrument(skip(self), fields(grid_id = self.id))]
    pub fn into_grid(self) -> Result<Grid, DbError> {
        let parse_axis = |raw: Option<String>| {
            raw.map(|s| s.parse::<AxisNumbers>())
                .transpose()
                .map_err(|e| DbError::new(format!("Grid {} has bad axis: {}", self.id, e)))
        };
        let x = parse_axis(self.x_axis)?;
        let y = parse_axis(self.y_axis)?;
        let axes = match (self.sealed, x, y) {
            (false, None, None) => None,
            (true, x, y) => Some(SealedAxes::from_parts(x, y).map_err(|e| {
                DbError::new(format!("Grid {} is sealed without axes: {}", self.id, e))
            })?),
            (false, _, _) => {
                return Err(DbError::new(format!(
                    "Grid {} has axes but is not sealed",
                    self.id
                )));
            }
        };

        let payouts: Payouts = self
            .payouts
            .parse()
            .map_err(|e| DbError::new(format!("Grid {} has bad payouts: {}", self.id, e)))?;
        let price_cents = u32::try_from(self.price_cents)
            .map_err(|_| DbError::new(format!("Grid {} has negative price", self.id)))?;

        let grid = NewGrid::new(self.name, self.x_label, self.y_label, price_cents, payouts);
        Ok(Grid::from_parts(self.id, grid, axes))
    }
}

/// Insertable grid row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::grids)]
pub struct NewGridRow {
    name: String,
    x_label: String,
    y_label: String,
    price_cents: i32,
    payouts: String,
}

impl TryFrom<&NewGrid> for NewGridRow {
    type Error = DbError;

    fn try_from(grid: &NewGrid) -> Result<Self, Self::Error> {
        let price_cents = i32::try_from(*grid.price_cents())
            .map_err(|_| DbError::new(format!("Price {} is too large", grid.price_cents())))?;
        Ok(Self::new(
            grid.name().clone(),
            grid.x_label().clone(),
            grid.y_label().clone(),
            price_cents,
            grid.payouts().to_string(),
        ))
    }
}

/// Claim row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::claims)]
pub struct ClaimRow {
    id: i32,
    grid_id: i32,
    display_name: String,
    email: Option<String>,
    phone: Option<String>,
    created_at: NaiveDateTime,
}

/// Insertable claim row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::claims)]
pub struct NewClaimRow {
    grid_id: i32,
    display_name: String,
    email: Option<String>,
    phone: Option<String>,
}

/// Cell row; `(grid_id, position)` is unique.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::cells)]
#[diesel(belongs_to(ClaimRow, foreign_key = claim_id))]
pub struct CellRow {
    id: i32,
    grid_id: i32,
    claim_id: i32,
    position: i32,
}

/// Insertable cell row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::cells)]
pub struct NewCellRow {
    grid_id: i32,
    claim_id: i32,
    position: i32,
}

/// Score row; `(grid_id, quarter)` is unique.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::scores)]
pub struct ScoreRow {
    id: i32,
    grid_id: i32,
    quarter: i32,
    x_score: i32,
    y_score: i32,
    updated_at: NaiveDateTime,
}

impl ScoreRow {
    /// Converts the stored row into a [`ScoreRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the quarter or a score is out of range.
    #[instrument(skip(self), fields(score_id = self.id))]
    pub fn to_record(&self) -> Result<ScoreRecord, DbError> {
        let quarter = Quarter::try_from(i64::from(self.quarter))
            .map_err(|e| DbError::new(format!("Score {}: {}", self.id, e)))?;
        let score = |value: i32| {
            u32::try_from(value)
                .map_err(|_| DbError::new(format!("Score {} is negative", self.id)))
        };
        Ok(ScoreRecord::new(quarter, score(self.x_score)?, score(self.y_score)?))
    }
}

/// Insertable score row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::scores)]
pub struct NewScoreRow {
    grid_id: i32,
    quarter: i32,
    x_score: i32,
    y_score: i32,
}

impl NewScoreRow {
    /// Builds the row for `score` on `grid_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a score does not fit the column.
    pub fn from_record(grid_id: i32, score: &ScoreRecord) -> Result<Self, DbError> {
        let column = |value: u32| {
            i32::try_from(value).map_err(|_| DbError::new(format!("Score {} is too large", value)))
        };
        Ok(Self::new(
            grid_id,
            i32::from(score.quarter().number()),
            column(*score.x_score())?,
            column(*score.y_score())?,
        ))
    }

    /// Stored x score.
    pub fn x_score(&self) -> i32 {
        self.x_score
    }

    /// Stored y score.
    pub fn y_score(&self) -> i32 {
        self.y_score
    }
}
