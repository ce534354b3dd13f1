//! Pure field intelligence engines
//!
//! Everything here is deterministic given its inputs and an injected random
//! source, so the same code runs on the server and in the browser.

pub mod alerts;
pub mod analyzer;
pub mod fallback;
pub mod zones;

pub use alerts::AlertEvaluator;
pub use analyzer::FieldHealthAnalyzer;
pub use fallback::FallbackEstimator;
pub use zones::ZoneGenerator;

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a yield figure to one decimal place, halves away from zero
pub fn round_yield(value: f64) -> Decimal {
    Decimal::from_f64_retain(value)
        .unwrap_or_default()
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}
