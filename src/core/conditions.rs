use super::error::FireError;
use super::types::TaxMode;

#[derive(Debug, Clone, Copy)]
pub struct EconomicConditions {
    pub inflation_rate_average_perc: f64,
    pub capital_tax_rate_perc: f64,
    pub tax_mode: TaxMode,
    pub start_age: u32,
}

impl EconomicConditions {
    pub fn new(
        inflation_rate_average_perc: f64,
        capital_tax_rate_perc: f64,
        tax_mode: TaxMode,
        start_age: u32,
    ) -> Result<Self, FireError> {
        let conditions = Self {
            inflation_rate_average_perc,
            capital_tax_rate_perc,
            tax_mode,
            start_age,
        };
        conditions.validate()?;
        Ok(conditions)
    }

    /// A 100% rate leaves nothing to spend after realization.
    pub fn validate(&self) -> Result<(), FireError> {
        let rate = self.capital_tax_rate_perc;
        if !rate.is_finite() || !(0.0..100.0).contains(&rate) {
            return Err(FireError::InvalidTaxRate(rate));
        }
        Ok(())
    }

    fn tax_rate(&self) -> f64 {
        self.capital_tax_rate_perc / 100.0
    }

    /// Pre-tax cash that has to be withdrawn to spend `desired_expense`.
    pub fn tax_adjusted_expense(&self, desired_expense: f64) -> f64 {
        match self.tax_mode {
            TaxMode::TaxOnRealization => desired_expense / (1.0 - self.tax_rate()),
            // gains were taxed as they accrued
            TaxMode::TaxAllGains => desired_expense,
        }
    }

    /// Returns `(taxed_value, tax_paid)`. A loss produces a negative tax (a credit).
    pub fn tax_capital_gain(&self, current_value: f64, previous_value: f64) -> (f64, f64) {
        match self.tax_mode {
            TaxMode::TaxAllGains => {
                let tax = self.tax_rate() * (current_value - previous_value);
                (current_value - tax, tax)
            }
            TaxMode::TaxOnRealization => (current_value, 0.0),
        }
    }
}
