use crate::constants::TOKENS_PER_MILLION;
use crate::error::{Result, TallyError};
use crate::types::{CostBreakdown, UsageEvent};
use std::collections::HashMap;

/// The closed set of billed token categories. Adding a category means
/// extending this enum, `ModelRates`, and `CostBreakdown` together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Input,
    Output,
    CacheCreation,
    CacheRead,
}

/// USD per million tokens for one model, by category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRates {
    pub input: f64,
    pub output: f64,
    pub cache_creation: f64,
    pub cache_read: f64,
}

impl ModelRates {
    #[inline]
    pub fn per(&self, category: TokenCategory) -> f64 {
        match category {
            TokenCategory::Input => self.input,
            TokenCategory::Output => self.output,
            TokenCategory::CacheCreation => self.cache_creation,
            TokenCategory::CacheRead => self.cache_read,
        }
    }
}

const OPUS_RATES: ModelRates = ModelRates {
    input: 15.0,
    output: 75.0,
    cache_creation: 18.75,
    cache_read: 1.50,
};

const SONNET_RATES: ModelRates = ModelRates {
    input: 3.0,
    output: 15.0,
    cache_creation: 3.75,
    cache_read: 0.30,
};

/// Lookup key normalization: model identifiers compare case- and
/// whitespace-insensitively.
pub fn normalize_model(model: &str) -> String {
    model.trim().to_ascii_lowercase()
}

/// Where per-category prices come from. The seam for injecting synthetic
/// pricing in tests.
#[cfg_attr(test, mockall::automock)]
pub trait PriceSource {
    fn price_for(&self, model: &str, category: TokenCategory) -> Result<f64>;
}

/// Immutable (model, category) -> USD-per-million-tokens table. A lookup
/// miss is a typed `UnknownModel` error; silent mispricing is worse than
/// a visible gap, so there is no fallback rate.
#[derive(Debug, Clone)]
pub struct PricingTable {
    rates: HashMap<String, ModelRates>,
}

impl PricingTable {
    /// Build a table from explicit entries. Keys are normalized.
    pub fn from_rates<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ModelRates)>,
        S: AsRef<str>,
    {
        let rates = entries
            .into_iter()
            .map(|(model, rates)| (normalize_model(model.as_ref()), rates))
            .collect();
        Self { rates }
    }

    pub fn rates_for(&self, model: &str) -> Result<ModelRates> {
        self.rates
            .get(&normalize_model(model))
            .copied()
            .ok_or_else(|| TallyError::UnknownModel {
                model: model.to_string(),
            })
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::from_rates([
            ("claude-opus-4-1-20250805", OPUS_RATES),
            ("claude-opus-4-20250514", OPUS_RATES),
            ("claude-3-opus-20240229", OPUS_RATES),
            ("claude-sonnet-4-20250514", SONNET_RATES),
            ("claude-3-5-sonnet-20241022", SONNET_RATES),
        ])
    }
}

impl PriceSource for PricingTable {
    fn price_for(&self, model: &str, category: TokenCategory) -> Result<f64> {
        Ok(self.rates_for(model)?.per(category))
    }
}

/// Derives a `CostBreakdown` from a `UsageEvent` using an injected price
/// source. Propagates `UnknownModel`; never substitutes a price.
#[derive(Debug, Clone)]
pub struct CostCalculator<P = PricingTable> {
    source: P,
}

impl<P: PriceSource> CostCalculator<P> {
    pub fn new(source: P) -> Self {
        Self { source }
    }

    pub fn cost_of(&self, event: &UsageEvent) -> Result<CostBreakdown> {
        let model = event.model.as_str();
        let input_rate = self.source.price_for(model, TokenCategory::Input)?;
        let output_rate = self.source.price_for(model, TokenCategory::Output)?;
        let cache_creation_rate = self.source.price_for(model, TokenCategory::CacheCreation)?;
        let cache_read_rate = self.source.price_for(model, TokenCategory::CacheRead)?;

        let tokens = event.tokens;
        // Clamped: a table pricing cache reads above input reports zero
        // savings, not negative
        let cache_savings = (tokens.cache_read as f64 * (input_rate - cache_read_rate)
            / TOKENS_PER_MILLION)
            .max(0.0);

        Ok(CostBreakdown {
            input_cost: tokens.input as f64 * input_rate / TOKENS_PER_MILLION,
            output_cost: tokens.output as f64 * output_rate / TOKENS_PER_MILLION,
            cache_creation_cost: tokens.cache_creation as f64 * cache_creation_rate
                / TOKENS_PER_MILLION,
            cache_read_cost: tokens.cache_read as f64 * cache_read_rate / TOKENS_PER_MILLION,
            cache_savings,
        })
    }
}
