//! Weighted rolling average over a fixed window of decimal samples

use log::warn;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Decimal places kept for every sample value
///
/// Values are rounded on insertion so products with integer weights, and the
/// running sums built from them, stay exact.
pub const VALUE_SCALE: u32 = 9;

/// Fixed-size ring of `(value, weight)` samples
///
/// The weighted sum and total weight are maintained incrementally: each `add`
/// subtracts the evicted slot and adds the new one. A slot with weight zero is
/// excluded from the mean; a window with no weighted slot averages to zero.
#[derive(Debug, Clone)]
pub struct WindowedAverage {
    values: Vec<Decimal>,
    weights: Vec<u64>,
    cursor: usize,
    weighted_sum: Decimal,
    total_weight: u128,
}

impl WindowedAverage {
    /// Create a window of `size` slots, each holding `seed` at `seed_weight`
    pub fn new(size: usize, seed: Decimal, seed_weight: u64) -> Self {
        let size = size.max(1);
        let seed = seed.round_dp(VALUE_SCALE);
        let seed_weight = seed_weight.max(1);
        let seed_product = seed * Decimal::from(seed_weight);

        Self {
            values: vec![seed; size],
            weights: vec![seed_weight; size],
            cursor: 0,
            weighted_sum: seed_product * Decimal::from(size as u64),
            total_weight: seed_weight as u128 * size as u128,
        }
    }

    /// Create a window whose slots are all excluded
    pub fn empty(size: usize) -> Self {
        let size = size.max(1);
        Self {
            values: vec![Decimal::ZERO; size],
            weights: vec![0; size],
            cursor: 0,
            weighted_sum: Decimal::ZERO,
            total_weight: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Replace the oldest slot with `value` at `weight`
    ///
    /// A zero weight is ignored, as is a sample whose product would overflow
    /// the decimal range.
    pub fn add(&mut self, value: Decimal, weight: u64) {
        if weight == 0 {
            return;
        }
        let value = value.round_dp(VALUE_SCALE);
        let Some(product) = value.checked_mul(Decimal::from(weight)) else {
            warn!("Dropping sample {} at weight {}: product out of range", value, weight);
            return;
        };

        let evicted = self.values[self.cursor] * Decimal::from(self.weights[self.cursor]);
        let Some(sum) = (self.weighted_sum - evicted).checked_add(product) else {
            warn!("Dropping sample {} at weight {}: sum out of range", value, weight);
            return;
        };

        self.weighted_sum = sum;
        self.total_weight = self.total_weight - self.weights[self.cursor] as u128 + weight as u128;
        self.values[self.cursor] = value;
        self.weights[self.cursor] = weight;
        self.cursor = (self.cursor + 1) % self.values.len();
    }

    /// Evict the oldest slot and leave an excluded one in its place
    pub fn push_excluded(&mut self) {
        let evicted = self.values[self.cursor] * Decimal::from(self.weights[self.cursor]);
        self.weighted_sum -= evicted;
        self.total_weight -= self.weights[self.cursor] as u128;
        self.values[self.cursor] = Decimal::ZERO;
        self.weights[self.cursor] = 0;
        self.cursor = (self.cursor + 1) % self.values.len();
    }

    /// Number of slots that count toward the mean
    pub fn weighted_slots(&self) -> usize {
        self.weights.iter().filter(|&&w| w > 0).count()
    }

    /// Add a float reading; NaN and infinite values are dropped
    pub fn add_f64(&mut self, value: f64, weight: u64) -> bool {
        match Decimal::from_f64(value) {
            Some(value) => {
                self.add(value, weight);
                true
            }
            None => false,
        }
    }

    /// Exact weighted mean, to the precision of decimal division
    pub fn average_decimal(&self) -> Decimal {
        if self.total_weight == 0 {
            return Decimal::ZERO;
        }
        self.weighted_sum / Decimal::from(self.total_weight)
    }

    pub fn average(&self) -> f64 {
        self.average_decimal().to_f64().unwrap_or(0.0)
    }

    /// Current window contents, oldest first
    pub fn samples(&self) -> impl Iterator<Item = (Decimal, u64)> + '_ {
        let len = self.values.len();
        (0..len).map(move |offset| {
            let i = (self.cursor + offset) % len;
            (self.values[i], self.weights[i])
        })
    }
}
