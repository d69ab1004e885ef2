// Module declarations
pub mod aggregate;
pub mod constants;
pub mod error;
pub mod formatting;
pub mod loader;
pub mod parser;
pub mod pricing;
pub mod series;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use aggregate::summarize;
pub use error::{ParseFailure, ParseReason, Result, TallyError};
pub use parser::parse_line;
pub use pricing::{CostCalculator, ModelRates, PriceSource, PricingTable, TokenCategory};
pub use series::{TimeBucket, build_series, daily_series, hourly_series};
pub use store::{EventFilter, EventStore, LoadReport, PricedEvent, Snapshot};
pub use types::{
    Cost, CostBreakdown, ModelUsage, ProjectName, SessionId, Summary, TokenCounts, UsageEvent,
};
