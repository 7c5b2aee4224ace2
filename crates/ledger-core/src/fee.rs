use rand::Rng;

use crate::constants::{FEE_PERCENT_MAX, FEE_PERCENT_MIN};

/// Source of the fee percentage charged on a transfer.
pub trait FeeSource: Send {
    fn fee_percent(&mut self) -> f64;
}

/// Uniform draw from `[FEE_PERCENT_MIN, FEE_PERCENT_MAX]`, rounded to two decimals.
#[derive(Debug, Default)]
pub struct RandomFee;

impl FeeSource for RandomFee {
    fn fee_percent(&mut self) -> f64 {
        let raw = rand::thread_rng().gen_range(FEE_PERCENT_MIN..=FEE_PERCENT_MAX);
        (raw * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedFee(pub f64);

impl FeeSource for FixedFee {
    fn fee_percent(&mut self) -> f64 {
        self.0
    }
}

pub fn fee_for(amount: f64, percent: f64) -> f64 {
    amount * percent / 100.0
}
