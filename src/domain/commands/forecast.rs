//! Queries and results for forecasting and goal projection.
use serde::{Deserialize, Serialize};

/// One calendar month of aggregated history. `month` is a `YYYY-MM` key;
/// months without any transactions are absent from a series, never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingForecastQuery {
    pub user_id: String,
    /// How many future calendar months to predict.
    pub months: u32,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedPoint {
    pub month: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingForecast {
    pub historical: Vec<MonthlyPoint>,
    pub predictions: Vec<PredictedPoint>,
    pub model_type: String,
}

/// Why a goal projection carries (or lacks) a completion estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionStatus {
    /// Target already met; no projection needed.
    Reached,
    /// A finite completion estimate was produced.
    Projected,
    /// No month in the lookback window had positive net savings, so no
    /// finite completion estimate exists.
    NoPositiveSavings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProjection {
    pub goal_id: String,
    pub description: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub remaining_amount: f64,
    pub status: ProjectionStatus,
    pub is_reached: bool,
    pub months_to_completion: u32,
    pub projected_completion_date: Option<String>,
    pub will_reach_by_target_date: Option<bool>,
    pub average_monthly_savings: Option<f64>,
}
