//! Token-based cost estimation.

use crate::config::DEFAULT_PRICE_PER_TOKEN;

/// Estimated USD cost of `token_count` tokens, or `None` when the count is unknown.
pub fn estimate_cost(token_count: Option<u64>, price_per_token: f64) -> Option<f64> {
    token_count.map(|tokens| tokens as f64 * price_per_token)
}

/// Prices token usage at a fixed per-token rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimator {
    pub price_per_token: f64,
}

impl CostEstimator {
    pub fn new(price_per_token: f64) -> Self {
        Self { price_per_token }
    }

    pub fn estimate(&self, token_count: Option<u64>) -> Option<f64> {
        estimate_cost(token_count, self.price_per_token)
    }
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_PER_TOKEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tokens_have_no_cost() {
        assert_eq!(estimate_cost(None, 0.5), None);
        assert_eq!(estimate_cost(None, 0.0), None);
    }

    #[test]
    fn test_cost_is_tokens_times_price() {
        assert_eq!(estimate_cost(Some(0), 0.5), Some(0.0));
        assert_eq!(estimate_cost(Some(1000), 0.5), Some(500.0));
    }

    #[test]
    fn test_default_price() {
        let estimator = CostEstimator::default();
        let cost = estimator.estimate(Some(1000)).unwrap();
        assert!((cost - 0.02).abs() < 1e-12);
    }
}
