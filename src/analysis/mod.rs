pub mod filter;
pub mod seller_update;
pub mod statistics;
pub mod timeline;

pub use filter::{filter, get_properties, search_properties, DEFAULT_CRITERIA_LIMIT, DEFAULT_SEARCH_LIMIT};
pub use seller_update::{market_summary, match_seller_update, MarketSummary, SellerUpdateMatch, DEFAULT_RESULT_LIMIT};
pub use statistics::{
    aggregate, aggregate_metrics, median, Metric, StatMetricSummary, StatisticsCache, StatisticsKey,
    StatisticsResult, ValueRange,
};
pub use timeline::{timeline, TimelineDataPoint};
