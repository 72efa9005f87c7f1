//! Engagement forecasting, caption similarity search, and generated content
//! recommendations.
//!
//! [`EngagementAnalyzer`] fits a trend to the engagement history and flags
//! trending periods. [`SimilarityIndex`] keeps TF-IDF vectors of past
//! captions for retrieval. [`RecommendationEngine`] combines both with a
//! [`TextGenerator`] to assemble a [`ContentPlan`].

pub mod error;
pub mod forecast;
pub mod generator;
pub mod index;
pub mod recommend;
pub mod types;

pub use error::{AnalysisError, GenerateError};
pub use forecast::{
    percentile, trending_topics, EngagementAnalyzer, EngagementForecast, ForecastPoint, Forecaster,
    LinearTrendForecaster, SeriesPoint, DEFAULT_FORECAST_PERIODS, DEFAULT_TRENDING_TOPICS,
    DEFAULT_TREND_PERCENTILE,
};
pub use generator::{GeminiClient, TextGenerator, UnconfiguredGenerator};
pub use index::{DocMetadata, QueryHit, SimilarityIndex};
pub use recommend::{
    analyze_account_type, analyze_engagement, analyze_posting_trends, RecommendationEngine,
    COMPETITOR_COUNT, FALLBACK_TOPICS, IMPROVEMENT_COUNT, RECOMMENDATIONS_PER_TOPIC,
};
pub use types::{
    AccountClass, AccountTypeAnalysis, AnalysisBundle, Competitor, ContentPlan,
    ContentRecommendation, EngagementAnalysis, GroupStats, ImprovementRecommendation,
    NextPostPrediction, PostingTrends, TrendingTopic,
};
