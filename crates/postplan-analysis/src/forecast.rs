//! Engagement trend forecasting and trending-period detection.
//!
//! The analyzer turns an [`EngagementRecord`] series into a fitted forecast
//! over the history dates plus a short future horizon, then flags the
//! forecast points that are both unusually high and late in the range.

use chrono::{DateTime, Duration, Utc};
use postplan_core::{parse_timestamp, EngagementRecord};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::TrendingTopic;

/// Daily steps predicted past the last history point.
pub const DEFAULT_FORECAST_PERIODS: u32 = 3;

/// Quantile of all predicted values a point must exceed to trend.
pub const DEFAULT_TREND_PERCENTILE: f64 = 0.75;

/// Trending topics surfaced in a content plan.
pub const DEFAULT_TRENDING_TOPICS: usize = 3;

/// One observed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub ds: DateTime<Utc>,
    pub y: f64,
}

/// One fitted or predicted value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub ds: DateTime<Utc>,
    pub yhat: f64,
}

/// Time-series model behind the analyzer.
pub trait Forecaster: Send + Sync {
    /// Fits on `history` (sorted ascending, at least two points) and returns
    /// a prediction for every history date followed by `periods` daily steps
    /// after the last one.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InsufficientData`] if `history` is empty.
    fn fit_predict(
        &self,
        history: &[SeriesPoint],
        periods: u32,
    ) -> Result<Vec<ForecastPoint>, AnalysisError>;
}

/// Ordinary least squares on elapsed days.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTrendForecaster;

/// A fitted straight line anchored at the first history date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub origin: DateTime<Utc>,
    pub intercept: f64,
    pub slope_per_day: f64,
}

#[allow(clippy::cast_precision_loss)]
fn elapsed_days(origin: DateTime<Utc>, ds: DateTime<Utc>) -> f64 {
    (ds - origin).num_seconds() as f64 / 86_400.0
}

impl LinearTrend {
    #[must_use]
    pub fn predict(&self, ds: DateTime<Utc>) -> f64 {
        self.intercept + self.slope_per_day * elapsed_days(self.origin, ds)
    }
}

impl LinearTrendForecaster {
    /// Fits a line through `history`. Points sharing one timestamp give a flat
    /// line at their mean.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InsufficientData`] if `history` is empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(history: &[SeriesPoint]) -> Result<LinearTrend, AnalysisError> {
        let first = history.first().ok_or(AnalysisError::InsufficientData)?;
        let origin = first.ds;
        let n = history.len() as f64;

        let ts: Vec<f64> = history.iter().map(|p| elapsed_days(origin, p.ds)).collect();
        let mean_t = ts.iter().sum::<f64>() / n;
        let mean_y = history.iter().map(|p| p.y).sum::<f64>() / n;

        let (sxy, sxx) = ts
            .iter()
            .zip(history)
            .fold((0.0, 0.0), |(sxy, sxx), (t, p)| {
                let dt = t - mean_t;
                (sxy + dt * (p.y - mean_y), sxx + dt * dt)
            });

        let slope_per_day = if sxx.abs() < f64::EPSILON {
            0.0
        } else {
            sxy / sxx
        };

        Ok(LinearTrend {
            origin,
            intercept: mean_y - slope_per_day * mean_t,
            slope_per_day,
        })
    }
}

impl Forecaster for LinearTrendForecaster {
    fn fit_predict(
        &self,
        history: &[SeriesPoint],
        periods: u32,
    ) -> Result<Vec<ForecastPoint>, AnalysisError> {
        let trend = Self::fit(history)?;
        let last = history
            .last()
            .ok_or(AnalysisError::InsufficientData)?
            .ds;

        let future = (1..=i64::from(periods)).map(|k| last + Duration::days(k));
        Ok(history
            .iter()
            .map(|p| p.ds)
            .chain(future)
            .map(|ds| ForecastPoint {
                ds,
                yhat: trend.predict(ds),
            })
            .collect())
    }
}

/// Output of [`EngagementAnalyzer::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementForecast {
    /// The series actually fitted, including any synthesized point.
    pub history: Vec<SeriesPoint>,
    pub forecast: Vec<ForecastPoint>,
    /// Percentile of every `yhat` in `forecast`, history dates included.
    pub threshold: f64,
    /// Forecast points above `threshold` in the later half of the date range.
    pub trending_periods: Vec<ForecastPoint>,
}

/// Forecasts an engagement series and detects trending periods.
pub struct EngagementAnalyzer {
    forecaster: Box<dyn Forecaster>,
    periods: u32,
    percentile: f64,
}

impl Default for EngagementAnalyzer {
    fn default() -> Self {
        Self::new(Box::new(LinearTrendForecaster))
    }
}

impl EngagementAnalyzer {
    #[must_use]
    pub fn new(forecaster: Box<dyn Forecaster>) -> Self {
        Self {
            forecaster,
            periods: DEFAULT_FORECAST_PERIODS,
            percentile: DEFAULT_TREND_PERCENTILE,
        }
    }

    #[must_use]
    pub fn with_periods(mut self, periods: u32) -> Self {
        self.periods = periods;
        self
    }

    #[must_use]
    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = percentile.clamp(0.0, 1.0);
        self
    }

    /// Converts records into a sorted series with at least two points.
    ///
    /// Records with unparseable timestamps are skipped. When none parse, the
    /// records are placed one day apart in list order instead. A lone point
    /// gets a companion one day earlier at 90% of its value.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InsufficientData`] for an empty series.
    #[allow(clippy::cast_precision_loss)]
    pub fn prepare(series: &[EngagementRecord]) -> Result<Vec<SeriesPoint>, AnalysisError> {
        let mut points: Vec<SeriesPoint> = series
            .iter()
            .filter_map(|record| match parse_timestamp(&record.timestamp) {
                Some(ds) => Some(SeriesPoint {
                    ds,
                    y: record.engagement as f64,
                }),
                None => {
                    tracing::warn!(
                        timestamp = %record.timestamp,
                        "skipping engagement record with unparseable timestamp"
                    );
                    None
                }
            })
            .collect();
        if points.is_empty() && !series.is_empty() {
            tracing::warn!(
                records = series.len(),
                "no usable timestamps; ordering engagement by position"
            );
            points = positional_series(series);
        }
        points.sort_by_key(|p| p.ds);

        match points.as_slice() {
            [] => Err(AnalysisError::InsufficientData),
            [only] => {
                let earlier = SeriesPoint {
                    ds: only.ds - Duration::days(1),
                    y: (only.y * 0.9).max(0.0),
                };
                tracing::info!("added synthetic engagement point to single-point series");
                Ok(vec![earlier, *only])
            }
            _ => Ok(points),
        }
    }

    /// Fits the series, forecasts ahead, and flags trending periods.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InsufficientData`] only for an empty series;
    /// any single record is enough.
    pub fn analyze(
        &self,
        series: &[EngagementRecord],
    ) -> Result<EngagementForecast, AnalysisError> {
        let history = Self::prepare(series)?;
        let forecast = self.forecaster.fit_predict(&history, self.periods)?;

        let values: Vec<f64> = forecast.iter().map(|p| p.yhat).collect();
        let threshold =
            percentile(&values, self.percentile).ok_or(AnalysisError::InsufficientData)?;

        let (Some(start), Some(end)) = (
            forecast.iter().map(|p| p.ds).min(),
            forecast.iter().map(|p| p.ds).max(),
        ) else {
            return Err(AnalysisError::InsufficientData);
        };
        let midpoint = start + (end - start) / 2;

        let trending_periods: Vec<ForecastPoint> = forecast
            .iter()
            .filter(|p| p.yhat > threshold && p.ds > midpoint)
            .copied()
            .collect();

        tracing::info!(
            history = history.len(),
            forecast = forecast.len(),
            threshold,
            trending = trending_periods.len(),
            "engagement forecast complete"
        );

        Ok(EngagementForecast {
            history,
            forecast,
            threshold,
            trending_periods,
        })
    }
}

/// Daily points from the epoch, one per record in list order.
#[allow(clippy::cast_precision_loss)]
fn positional_series(series: &[EngagementRecord]) -> Vec<SeriesPoint> {
    (0_i64..)
        .zip(series)
        .map(|(day, record)| SeriesPoint {
            ds: DateTime::<Utc>::UNIX_EPOCH + Duration::days(day),
            y: record.engagement as f64,
        })
        .collect()
}

/// Linear-interpolation quantile (`q` in `[0, 1]`). `None` for no values.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// The first `top_n` trending periods, in date order, as plan topics.
#[must_use]
pub fn trending_topics(forecast: &EngagementForecast, top_n: usize) -> Vec<TrendingTopic> {
    forecast
        .trending_periods
        .iter()
        .take(top_n)
        .map(|p| TrendingTopic {
            date: p.ds.format("%Y-%m-%d").to_string(),
            value: p.yhat,
            topic: format!("Trending on {}", p.ds.format("%B %d")),
        })
        .collect()
}

#[cfg(test)]
#[path = "forecast_test.rs"]
mod tests;
