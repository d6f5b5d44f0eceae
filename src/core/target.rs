use serde::Serialize;

use super::error::FireError;
use super::types::{Frequency, TargetItem};

/// Spending items plus the withdrawal rate that turns them into a lump sum.
#[derive(Debug, Clone)]
pub struct TargetProfile {
    pub items: Vec<TargetItem>,
    pub withdrawal_rate_perc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetShare {
    pub name: String,
    pub frequency: Frequency,
    pub value_at_retirement: f64,
}

impl TargetProfile {
    pub fn new(items: Vec<TargetItem>, withdrawal_rate_perc: f64) -> Result<Self, FireError> {
        if !(withdrawal_rate_perc.is_finite() && withdrawal_rate_perc > 0.0) {
            return Err(FireError::InvalidWithdrawalRate(withdrawal_rate_perc));
        }
        Ok(Self {
            items,
            withdrawal_rate_perc,
        })
    }

    pub fn fire_factor(&self) -> f64 {
        100.0 / self.withdrawal_rate_perc
    }

    fn factor(&self, frequency: Frequency) -> f64 {
        match frequency {
            Frequency::OneTime => 1.0,
            Frequency::Yearly => self.fire_factor(),
            Frequency::Monthly => self.fire_factor() * 12.0,
        }
    }

    /// Nominal value needed at the moment retirement starts.
    pub fn value_at_retirement(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.value * self.factor(item.frequency))
            .sum()
    }

    /// Per-item contribution to [`Self::value_at_retirement`].
    pub fn breakdown(&self) -> Vec<TargetShare> {
        self.items
            .iter()
            .map(|item| TargetShare {
                name: item.name.clone(),
                frequency: item.frequency,
                value_at_retirement: item.value * self.factor(item.frequency),
            })
            .collect()
    }

    pub fn fixed_one_time_total(&self) -> f64 {
        self.total_for(Frequency::OneTime)
    }

    pub fn variable_yearly_total(&self) -> f64 {
        self.total_for(Frequency::Yearly)
    }

    fn total_for(&self, frequency: Frequency) -> f64 {
        self.items
            .iter()
            .filter(|item| item.frequency == frequency)
            .map(|item| item.value)
            .sum()
    }
}
