use tracing::{debug, info};

use super::conditions::EconomicConditions;
use super::error::FireError;
use super::portfolio::Portfolio;
use super::series::{PeriodRecord, ResultTimeSeries};
use super::target::TargetProfile;
use super::types::{AllocationLine, AllocationTable};

const MONTHS_PER_YEAR: u32 = 12;

/// Cash leaving the portfolio in one period, already tax adjusted.
#[derive(Debug, Clone, Copy, Default)]
struct PeriodExpenses {
    monthly_recurring: f64,
    monthly_fixed: f64,
    lump_fixed: f64,
    lump_recurring: f64,
}

/// Ending value and net cash deposited for one flow line.
#[derive(Debug, Clone, Copy)]
struct FlowOutcome {
    value: f64,
    principal: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Simulation<'a> {
    portfolio: &'a Portfolio,
    target: &'a TargetProfile,
    conditions: &'a EconomicConditions,
}

pub fn run_simulation(
    portfolio: &Portfolio,
    target: &TargetProfile,
    conditions: &EconomicConditions,
    max_periods: u32,
) -> Result<ResultTimeSeries, FireError> {
    Simulation::new(portfolio, target, conditions).perform(max_periods)
}

impl<'a> Simulation<'a> {
    pub fn new(
        portfolio: &'a Portfolio,
        target: &'a TargetProfile,
        conditions: &'a EconomicConditions,
    ) -> Self {
        Self {
            portfolio,
            target,
            conditions,
        }
    }

    /// Seeds year 0 and advances one year at a time up to and including `max_periods`.
    pub fn perform(&self, max_periods: u32) -> Result<ResultTimeSeries, FireError> {
        self.conditions.validate()?;
        let target_value = self.target.value_at_retirement();
        let mut series = ResultTimeSeries::new(
            self.conditions.start_age,
            self.conditions.inflation_rate_average_perc,
            target_value,
            max_periods as usize + 1,
        );

        let mut previous = self.seed_period();
        series.push(previous.clone());

        for _ in 0..max_periods {
            let record = self.advance(&previous, series.retirement_time(), target_value)?;
            if record.is_retired && !previous.is_retired {
                info!(
                    time = record.time,
                    age = record.time + self.conditions.start_age,
                    total = record.total_valuation,
                    target = target_value,
                    "retirement target reached"
                );
            }
            series.push(record.clone());
            previous = record;
        }

        Ok(series)
    }

    fn seed_period(&self) -> PeriodRecord {
        let fixed = self.portfolio.fixed.clone();
        let recurring = self.portfolio.recurring.with_values(0.0);
        let flow = self.portfolio.recurring.clone();
        let contribution = self.portfolio.recurring.clone();

        let fixed_total_valuation = fixed.total_value();
        let recurring_total_valuation = recurring.total_value();
        PeriodRecord {
            time: 0,
            fixed_total_valuation,
            recurring_total_valuation,
            recurring_flow_valuation: flow.total_value(),
            total_valuation: fixed_total_valuation + recurring_total_valuation,
            tax_paid: 0.0,
            is_retired: false,
            fixed,
            recurring,
            flow,
            contribution,
        }
    }

    fn advance(
        &self,
        previous: &PeriodRecord,
        retirement_time: Option<u32>,
        target_value: f64,
    ) -> Result<PeriodRecord, FireError> {
        let time = previous.time + 1;
        let was_retired = previous.is_retired;
        let retirement_edge = was_retired && retirement_time == Some(previous.time);

        let expenses = self.size_expenses(previous, retirement_edge);
        let contribution = self.next_contribution(&previous.contribution, was_retired);

        let monthly_expense = split_by_share(&previous.recurring, expenses.monthly_recurring)?;
        let lump_recurring = split_by_share(&previous.recurring, expenses.lump_recurring)?;
        let fixed_expense = split_by_share(&previous.fixed, expenses.monthly_fixed)?;
        let lump_fixed = split_by_share(&previous.fixed, expenses.lump_fixed)?;

        let flow_outcomes = contribution
            .lines
            .iter()
            .zip(&monthly_expense)
            .map(|(line, expense)| compound_monthly(line.value, *expense, line.monthly_rate()))
            .collect::<Vec<_>>();
        let flow = AllocationTable {
            lines: contribution
                .lines
                .iter()
                .zip(&flow_outcomes)
                .map(|(line, outcome)| with_value(line, outcome.value))
                .collect(),
        };

        let mut tax_paid = 0.0;

        // Flow lands at year end on top of a year of growth; the lump leaves at year end.
        let recurring = AllocationTable {
            lines: previous
                .recurring
                .lines
                .iter()
                .zip(&flow_outcomes)
                .zip(&lump_recurring)
                .map(|((line, outcome), lump)| {
                    let grown = line.value * (1.0 + line.yearly_rate()) + outcome.value - lump;
                    let basis = line.value + outcome.principal - lump;
                    let (taxed, tax) = self.conditions.tax_capital_gain(grown, basis);
                    tax_paid += tax;
                    with_value(line, taxed)
                })
                .collect(),
        };

        // The lump leaves the fixed pool before the year's growth. Monthly expenses only
        // reach it when the recurring table cannot carry them.
        let fixed = AllocationTable {
            lines: previous
                .fixed
                .lines
                .iter()
                .zip(&lump_fixed)
                .zip(&fixed_expense)
                .map(|((line, lump), expense)| {
                    let drawn = compound_monthly(0.0, *expense, line.monthly_rate());
                    let start = line.value - lump;
                    let grown = start * (1.0 + line.yearly_rate()) + drawn.value;
                    let basis = start + drawn.principal;
                    let (taxed, tax) = self.conditions.tax_capital_gain(grown, basis);
                    tax_paid += tax;
                    with_value(line, taxed)
                })
                .collect(),
        };

        let fixed_total_valuation = fixed.total_value();
        let recurring_total_valuation = recurring.total_value();
        let total_valuation = fixed_total_valuation + recurring_total_valuation;
        let is_retired = was_retired || total_valuation >= target_value;

        debug!(
            time,
            fixed = fixed_total_valuation,
            recurring = recurring_total_valuation,
            flow = flow.total_value(),
            tax_paid,
            is_retired,
            "period advanced"
        );

        Ok(PeriodRecord {
            time,
            recurring_flow_valuation: flow.total_value(),
            fixed_total_valuation,
            recurring_total_valuation,
            total_valuation,
            tax_paid,
            is_retired,
            fixed,
            recurring,
            flow,
            contribution,
        })
    }

    fn size_expenses(&self, previous: &PeriodRecord, retirement_edge: bool) -> PeriodExpenses {
        if !previous.is_retired {
            return PeriodExpenses::default();
        }

        let monthly = self
            .conditions
            .tax_adjusted_expense(self.target.variable_yearly_total() / 12.0);
        let (lump_fixed, lump_recurring) = if retirement_edge {
            self.split_lump(previous)
        } else {
            (0.0, 0.0)
        };

        // Lump-sum-only portfolios have no recurring lines to withdraw from.
        if self.portfolio.recurring.total_share() == 0.0 {
            return PeriodExpenses {
                monthly_fixed: monthly,
                lump_fixed: lump_fixed + lump_recurring,
                ..PeriodExpenses::default()
            };
        }
        PeriodExpenses {
            monthly_recurring: monthly,
            monthly_fixed: 0.0,
            lump_fixed,
            lump_recurring,
        }
    }

    /// One-time expense split by the pools' valuations in the retirement-edge period.
    fn split_lump(&self, previous: &PeriodRecord) -> (f64, f64) {
        let lump = self.target.fixed_one_time_total();
        let fixed_value = previous.fixed_total_valuation;
        let recurring_value = previous.recurring_total_valuation;
        let total = fixed_value + recurring_value;
        let (fixed_part, recurring_part) = if total == 0.0 {
            (0.0, lump)
        } else {
            (lump * fixed_value / total, lump * recurring_value / total)
        };
        (
            self.conditions.tax_adjusted_expense(fixed_part),
            self.conditions.tax_adjusted_expense(recurring_part),
        )
    }

    fn next_contribution(&self, previous: &AllocationTable, retired: bool) -> AllocationTable {
        if retired {
            return previous.with_values(0.0);
        }
        let growth = 1.0 + self.portfolio.recurring_yearly_growth_perc / 100.0;
        AllocationTable {
            lines: previous
                .lines
                .iter()
                .map(|line| with_value(line, line.value * growth))
                .collect(),
        }
    }
}

fn with_value(line: &AllocationLine, value: f64) -> AllocationLine {
    AllocationLine {
        value,
        ..line.clone()
    }
}

fn split_by_share(table: &AllocationTable, amount: f64) -> Result<Vec<f64>, FireError> {
    if amount == 0.0 {
        return Ok(vec![0.0; table.lines.len()]);
    }
    Ok(table
        .share_weights()?
        .into_iter()
        .map(|weight| weight * amount)
        .collect())
}

/// Twelve monthly steps, each deposit (contribution less expense) made at the start of the month.
fn compound_monthly(contribution: f64, expense: f64, monthly_rate: f64) -> FlowOutcome {
    let deposit = contribution - expense;
    let mut value = 0.0;
    let mut principal = 0.0;
    for _ in 0..MONTHS_PER_YEAR {
        principal += deposit;
        value = (value + deposit) * (1.0 + monthly_rate);
    }
    FlowOutcome { value, principal }
}
