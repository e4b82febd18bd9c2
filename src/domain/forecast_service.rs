//! Spending forecasts from monthly history.
//!
//! The model is deliberately simple: a trailing mean of the most recent
//! spending months, with a bounded random wobble so consecutive predicted
//! months don't come out as a flat line. The wobble source is injectable so
//! tests can pin it.

use log::info;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::WalletConfig;
use crate::domain::commands::forecast::{PredictedPoint, SpendingForecast, SpendingForecastQuery};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ledger::LedgerSynchronizer;
use crate::domain::models::transaction::TransactionType;
use crate::domain::monthly::{monthly_series, next_month_key, trailing_mean, AggregationMode};
use crate::storage::traits::Connection;

/// Variation factor applied to each predicted month. Implementations must
/// stay within `[0.9, 1.1]`.
pub trait VariationSource: Send + Sync {
    fn factor(&self) -> f64;
}

/// Production source: folds the subsecond clock into the `[0.9, 1.1]` band.
pub struct ClockVariation;

impl VariationSource for ClockVariation {
    fn factor(&self) -> f64 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        0.9 + 0.2 * f64::from(nanos % 10_000) / 10_000.0
    }
}

/// Constant factor, for deterministic tests.
pub struct FixedVariation(pub f64);

impl VariationSource for FixedVariation {
    fn factor(&self) -> f64 {
        self.0
    }
}

pub struct ForecastEngine<C: Connection> {
    ledger: LedgerSynchronizer<C>,
    config: WalletConfig,
    variation: Arc<dyn VariationSource>,
}

impl<C: Connection> ForecastEngine<C> {
    pub fn new(connection: Arc<C>, config: WalletConfig) -> Self {
        Self::with_variation(connection, config, Arc::new(ClockVariation))
    }

    pub fn with_variation(
        connection: Arc<C>,
        config: WalletConfig,
        variation: Arc<dyn VariationSource>,
    ) -> Self {
        Self {
            ledger: LedgerSynchronizer::new(connection),
            config,
            variation,
        }
    }

    /// Predict spending for the requested number of future months. Each
    /// prediction is `round(mean * factor)` where the mean trails the most
    /// recent spending months and the factor stays within ten percent of
    /// one. Fails with `InsufficientData` when the lookback window holds
    /// too few expense entries to mean anything.
    pub fn predict_spending(&self, query: SpendingForecastQuery) -> DomainResult<SpendingForecast> {
        if query.months == 0 {
            return Err(DomainError::validation(
                "forecast must cover at least one month",
            ));
        }

        let history = self.ledger.in_lookback_window(
            &query.user_id,
            self.config.lookback_months,
            Some(TransactionType::Expense),
            query.category.clone(),
        )?;
        if history.len() < self.config.min_samples {
            return Err(DomainError::InsufficientData(format!(
                "need at least {} expense entries in the last {} months, found {}",
                self.config.min_samples,
                self.config.lookback_months,
                history.len()
            )));
        }

        let historical = monthly_series(&history, AggregationMode::Spending);
        let mean = trailing_mean(&historical, self.config.window).ok_or_else(|| {
            DomainError::InsufficientData("no spending months in the lookback window".to_string())
        })?;

        let mut month = historical
            .last()
            .map(|point| point.month.clone())
            .ok_or_else(|| {
                DomainError::InsufficientData("no spending months in the lookback window".to_string())
            })?;
        let mut predictions = Vec::with_capacity(query.months as usize);
        for _ in 0..query.months {
            month = next_month_key(&month).map_err(DomainError::Validation)?;
            predictions.push(PredictedPoint {
                month: month.clone(),
                amount: (mean * self.variation.factor()).round(),
            });
        }

        info!(
            "Forecast for user {}: mean {:.2} over {} historical months, {} predicted",
            query.user_id,
            mean,
            historical.len(),
            predictions.len()
        );
        Ok(SpendingForecast {
            historical,
            predictions,
            model_type: "statistical".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::transactions::RecordTransactionCommand;
    use crate::domain::models::transaction::PaymentMethod;
    use crate::storage::csv::test_utils::TestEnvironment;
    use crate::storage::csv::CsvConnection;
    use chrono::Months;

    fn engine(factor: f64) -> (ForecastEngine<CsvConnection>, TestEnvironment) {
        let env = TestEnvironment::new().unwrap();
        let engine = ForecastEngine::with_variation(
            Arc::new(env.connection.clone()),
            WalletConfig::new("4821"),
            Arc::new(FixedVariation(factor)),
        );
        (engine, env)
    }

    fn seed_expenses(engine: &ForecastEngine<CsvConnection>, amounts: &[f64]) {
        // One expense per month, newest in the current month.
        let now = crate::domain::now_fixed();
        for (i, amount) in amounts.iter().enumerate() {
            let months_back = (amounts.len() - 1 - i) as u32;
            let date = now.checked_sub_months(Months::new(months_back)).unwrap();
            engine
                .ledger
                .record(RecordTransactionCommand {
                    user_id: "alice".to_string(),
                    transaction_type: TransactionType::Expense,
                    amount: *amount,
                    category: "Groceries".to_string(),
                    date: Some(date),
                    payment_method: PaymentMethod::Cash,
                    description: None,
                    notes: None,
                })
                .unwrap();
        }
    }

    #[test]
    fn test_insufficient_data_below_minimum() {
        let (engine, _env) = engine(1.0);
        seed_expenses(&engine, &[1000.0, 1200.0]);

        let result = engine.predict_spending(SpendingForecastQuery {
            user_id: "alice".to_string(),
            months: 3,
            category: None,
        });
        assert!(matches!(result, Err(DomainError::InsufficientData(_))));
    }

    #[test]
    fn test_prediction_stays_within_variation_band() {
        // Trailing mean of [1000, 1200, 1100] is 1100, so every prediction
        // must land in [990, 1210].
        for factor in [0.9, 1.0, 1.1] {
            let (engine, _env) = engine(factor);
            seed_expenses(&engine, &[1000.0, 1200.0, 1100.0]);

            let forecast = engine
                .predict_spending(SpendingForecastQuery {
                    user_id: "alice".to_string(),
                    months: 4,
                    category: None,
                })
                .unwrap();

            assert_eq!(forecast.model_type, "statistical");
            assert_eq!(forecast.predictions.len(), 4);
            for point in &forecast.predictions {
                assert!(
                    (990.0..=1210.0).contains(&point.amount),
                    "prediction {} out of band",
                    point.amount
                );
                assert_eq!(point.amount, point.amount.round());
            }
        }
    }

    #[test]
    fn test_predictions_follow_the_last_historical_month() {
        let (engine, _env) = engine(1.0);
        seed_expenses(&engine, &[1000.0, 1200.0, 1100.0]);

        let forecast = engine
            .predict_spending(SpendingForecastQuery {
                user_id: "alice".to_string(),
                months: 2,
                category: None,
            })
            .unwrap();

        let last_historical = &forecast.historical.last().unwrap().month;
        assert_eq!(
            forecast.predictions[0].month,
            next_month_key(last_historical).unwrap()
        );
        assert_eq!(
            forecast.predictions[1].month,
            next_month_key(&forecast.predictions[0].month).unwrap()
        );
        assert_eq!(forecast.predictions[0].amount, 1100.0);
    }

    #[test]
    fn test_category_filter_narrows_history() {
        let (engine, _env) = engine(1.0);
        seed_expenses(&engine, &[1000.0, 1200.0, 1100.0]);

        let result = engine.predict_spending(SpendingForecastQuery {
            user_id: "alice".to_string(),
            months: 1,
            category: Some("Travel".to_string()),
        });
        assert!(matches!(result, Err(DomainError::InsufficientData(_))));
    }

    #[test]
    fn test_zero_months_is_rejected() {
        let (engine, _env) = engine(1.0);
        assert!(matches!(
            engine.predict_spending(SpendingForecastQuery {
                user_id: "alice".to_string(),
                months: 0,
                category: None,
            }),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_clock_variation_stays_in_band() {
        let source = ClockVariation;
        for _ in 0..50 {
            let factor = source.factor();
            assert!((0.9..=1.1).contains(&factor));
        }
    }
}
