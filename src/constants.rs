/// Upper bound on the number of buckets a single series request may produce.
/// Guards against pathological ranges (e.g. a 30-day range at 1-second width).
pub const MAX_SERIES_BUCKETS: usize = 1_000;

/// Pricing tables are expressed in USD per million tokens.
pub const TOKENS_PER_MILLION: f64 = 1_000_000.0;
