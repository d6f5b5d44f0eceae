//! Read-only views over a finished projection: summaries, tables and chart data.

use std::fmt::Write as _;

use serde::Serialize;

use crate::core::{
    EconomicConditions, FireError, Portfolio, ResultTimeSeries, TargetProfile, TargetShare,
    run_simulation,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub target_value_at_retirement: f64,
    pub fire_factor: f64,
    pub target_breakdown: Vec<TargetShare>,
    pub fixed_average_yield_perc: Option<f64>,
    pub recurring_average_yield_perc: Option<f64>,
    /// Pool yields weighted by pool valuation at retirement (or the last period).
    pub average_yield_perc: Option<f64>,
    /// Average yield less average inflation.
    pub real_average_yield_perc: Option<f64>,
    /// Real yield less the withdrawal rate, i.e. the yearly drift once retired.
    pub retirement_net_yield_perc: Option<f64>,
    pub retirement_net_loss_warning: bool,
    pub retirement_time: Option<u32>,
    pub retirement_age: Option<u32>,
    pub final_total_valuation: f64,
    pub final_real_total_valuation: f64,
}

impl ScenarioSummary {
    pub fn new(
        portfolio: &Portfolio,
        target: &TargetProfile,
        conditions: &EconomicConditions,
        series: &ResultTimeSeries,
    ) -> Self {
        // An empty table has no average; that is not fatal for a summary.
        let fixed_average_yield_perc = portfolio.fixed_average_yield().ok();
        let recurring_average_yield_perc = portfolio.recurring_average_yield().ok();
        let weighing_record = series
            .retirement_time()
            .and_then(|t| series.records().get(t as usize))
            .or_else(|| series.last());
        let average_yield_perc = match (fixed_average_yield_perc, recurring_average_yield_perc) {
            (Some(fixed), Some(recurring)) => Some(weighted_pool_yield(
                fixed,
                recurring,
                weighing_record.map_or(0.0, |r| r.fixed_total_valuation),
                weighing_record.map_or(0.0, |r| r.recurring_total_valuation),
            )),
            (fixed, recurring) => fixed.or(recurring),
        };
        let real_average_yield_perc =
            average_yield_perc.map(|y| y - conditions.inflation_rate_average_perc);
        let retirement_net_yield_perc =
            real_average_yield_perc.map(|y| y - target.withdrawal_rate_perc);

        Self {
            target_value_at_retirement: target.value_at_retirement(),
            fire_factor: target.fire_factor(),
            target_breakdown: target.breakdown(),
            fixed_average_yield_perc,
            recurring_average_yield_perc,
            average_yield_perc,
            real_average_yield_perc,
            retirement_net_yield_perc,
            retirement_net_loss_warning: retirement_net_yield_perc.is_some_and(|y| y < 0.0),
            retirement_time: series.retirement_time(),
            retirement_age: series.retirement_age(),
            final_total_valuation: series.last().map_or(0.0, |r| r.total_valuation),
            final_real_total_valuation: series
                .real_total_valuation()
                .last()
                .copied()
                .unwrap_or(0.0),
        }
    }
}

fn weighted_pool_yield(fixed: f64, recurring: f64, fixed_value: f64, recurring_value: f64) -> f64 {
    let total = fixed_value + recurring_value;
    if total <= 0.0 {
        return (fixed + recurring) / 2.0;
    }
    (fixed * fixed_value + recurring * recurring_value) / total
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLine {
    pub label: &'static str,
    pub values: Vec<f64>,
}

/// Everything needed to draw the valuation-over-age chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub ages: Vec<u32>,
    pub lines: Vec<ChartLine>,
    pub target_value: f64,
    pub retirement_age: Option<u32>,
}

pub fn chart(series: &ResultTimeSeries) -> Chart {
    let title = match series.retirement_age() {
        Some(age) => format!("Retirement possible at age {age}"),
        None => "Retirement target not reached".to_string(),
    };
    Chart {
        title,
        x_label: "Age / [years]",
        y_label: "Value / [€]",
        ages: series.ages(),
        lines: vec![
            ChartLine {
                label: "Total",
                values: series.total_valuation(),
            },
            ChartLine {
                label: "Fixed investments",
                values: series.fixed_total_valuation(),
            },
            ChartLine {
                label: "Recurring investments",
                values: series.recurring_total_valuation(),
            },
            ChartLine {
                label: "Yearly recurring flow",
                values: series.recurring_flow_valuation(),
            },
            ChartLine {
                label: "Total (inflation adjusted)",
                values: series.real_total_valuation(),
            },
        ],
        target_value: series.target_value_at_retirement(),
        retirement_age: series.retirement_age(),
    }
}

/// `12397.6` -> `"12,398€"`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}€")
    } else {
        format!("{grouped}€")
    }
}

pub fn render_table(series: &ResultTimeSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4} {:>4} {:>16} {:>16} {:>16} {:>16} {:>8}",
        "year", "age", "fixed", "recurring", "flow", "total", "retired"
    );
    for record in series.records() {
        let _ = writeln!(
            out,
            "{:>4} {:>4} {:>16} {:>16} {:>16} {:>16} {:>8}",
            record.time,
            record.time + series.start_age(),
            format_currency(record.fixed_total_valuation),
            format_currency(record.recurring_total_valuation),
            format_currency(record.recurring_flow_valuation),
            format_currency(record.total_valuation),
            if record.is_retired { "yes" } else { "no" }
        );
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub investment: String,
    pub target: String,
    pub target_value_at_retirement: f64,
    pub retirement_time: Option<u32>,
    pub retirement_age: Option<u32>,
    pub final_total_valuation: f64,
}

/// Runs every investment/target pairing under the same conditions.
pub fn compare(
    investments: &[(&str, Portfolio)],
    targets: &[(&str, TargetProfile)],
    conditions: &EconomicConditions,
    max_periods: u32,
) -> Result<Vec<ComparisonRow>, FireError> {
    let mut rows = Vec::with_capacity(investments.len() * targets.len());
    for (investment_name, portfolio) in investments {
        for (target_name, target) in targets {
            let series = run_simulation(portfolio, target, conditions, max_periods)?;
            rows.push(ComparisonRow {
                investment: investment_name.to_string(),
                target: target_name.to_string(),
                target_value_at_retirement: target.value_at_retirement(),
                retirement_time: series.retirement_time(),
                retirement_age: series.retirement_age(),
                final_total_valuation: series.last().map_or(0.0, |r| r.total_valuation),
            });
        }
    }
    Ok(rows)
}

pub fn render_comparison(rows: &[ComparisonRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<16} {:>16} {:>10} {:>16}",
        "investment", "target", "target value", "ret. age", "final total"
    );
    for row in rows {
        let age = row
            .retirement_age
            .map_or_else(|| "-".to_string(), |age| age.to_string());
        let _ = writeln!(
            out,
            "{:<16} {:<16} {:>16} {:>10} {:>16}",
            row.investment,
            row.target,
            format_currency(row.target_value_at_retirement),
            age,
            format_currency(row.final_total_valuation)
        );
    }
    out
}
