use std::fmt;

/// A newtype wrapper for cost values in USD
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Cost(f64);

impl Cost {
    /// Create a new Cost from a raw value
    #[inline]
    pub fn new(value: f64) -> Self {
        Cost(value)
    }

    /// Get the raw value
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Format as currency string (e.g., "$1.23")
    pub fn to_formatted_string(&self) -> String {
        // Handle negative zero case
        let formatted_value = if self.0.abs() < 0.005 { 0.00 } else { self.0 };
        format!("${:.2}", formatted_value)
    }

    /// Check if the cost is positive (greater than tolerance)
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > 0.005
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_formatted_string())
    }
}

impl From<f64> for Cost {
    fn from(value: f64) -> Self {
        Cost(value)
    }
}

impl From<Cost> for f64 {
    fn from(cost: Cost) -> Self {
        cost.0
    }
}

/// Per-category cost of one event, derived from its model's rates.
/// Always re-derivable from (model, token counts); never stored apart
/// from its source event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub cache_creation_cost: f64,
    pub cache_read_cost: f64,
    /// What re-reading the cached tokens at the input rate would have
    /// cost, minus what they actually cost. Clamped to >= 0.
    pub cache_savings: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.input_cost + self.output_cost + self.cache_creation_cost + self.cache_read_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_formatting() {
        assert_eq!(Cost::new(1.234).to_formatted_string(), "$1.23");
        assert_eq!(Cost::new(0.0).to_formatted_string(), "$0.00");
        assert_eq!(Cost::new(-0.0).to_formatted_string(), "$0.00");
        assert_eq!(Cost::new(0.004).to_formatted_string(), "$0.00");
        assert_eq!(Cost::new(0.005).to_formatted_string(), "$0.01");
        assert_eq!(Cost::new(100.999).to_formatted_string(), "$101.00");
    }

    #[test]
    fn test_cost_zero_checks() {
        assert!(!Cost::new(0.0).is_positive());
        assert!(!Cost::new(0.005).is_positive());
        assert!(Cost::new(0.006).is_positive());
        assert!(Cost::new(1.0).is_positive());
    }

    #[test]
    fn test_cost_display() {
        let cost = Cost::new(42.42);
        assert_eq!(format!("{}", cost), "$42.42");
    }

    #[test]
    fn test_breakdown_total() {
        let breakdown = CostBreakdown {
            input_cost: 0.015,
            output_cost: 0.0375,
            cache_creation_cost: 0.00375,
            cache_read_cost: 0.00045,
            cache_savings: 0.0,
        };
        assert!((breakdown.total() - 0.0567).abs() < 1e-10);
        assert_eq!(CostBreakdown::default().total(), 0.0);
    }
}
