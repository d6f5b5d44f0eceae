use serde::Serialize;

use super::types::AllocationTable;

/// State of the projection at the end of one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRecord {
    pub time: u32,
    pub fixed: AllocationTable,
    pub recurring: AllocationTable,
    /// This year's contributions (net of expenses), compounded to year end.
    pub flow: AllocationTable,
    /// Monthly contribution per line in force this year.
    pub contribution: AllocationTable,
    pub fixed_total_valuation: f64,
    pub recurring_total_valuation: f64,
    pub recurring_flow_valuation: f64,
    pub total_valuation: f64,
    pub tax_paid: f64,
    pub is_retired: bool,
}

/// Append-only output of one `perform` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultTimeSeries {
    records: Vec<PeriodRecord>,
    retirement_time: Option<u32>,
    start_age: u32,
    inflation_rate_average_perc: f64,
    target_value_at_retirement: f64,
}

impl ResultTimeSeries {
    pub(crate) fn new(
        start_age: u32,
        inflation_rate_average_perc: f64,
        target_value_at_retirement: f64,
        capacity: usize,
    ) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            retirement_time: None,
            start_age,
            inflation_rate_average_perc,
            target_value_at_retirement,
        }
    }

    pub(crate) fn push(&mut self, record: PeriodRecord) {
        if record.is_retired && self.retirement_time.is_none() {
            self.retirement_time = Some(record.time);
        }
        self.records.push(record);
    }

    pub fn records(&self) -> &[PeriodRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&PeriodRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn retirement_time(&self) -> Option<u32> {
        self.retirement_time
    }

    pub fn retirement_age(&self) -> Option<u32> {
        self.retirement_time.map(|t| t + self.start_age)
    }

    pub fn start_age(&self) -> u32 {
        self.start_age
    }

    pub fn target_value_at_retirement(&self) -> f64 {
        self.target_value_at_retirement
    }

    pub fn times(&self) -> Vec<u32> {
        self.records.iter().map(|r| r.time).collect()
    }

    pub fn ages(&self) -> Vec<u32> {
        self.records.iter().map(|r| r.time + self.start_age).collect()
    }

    pub fn total_valuation(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.total_valuation).collect()
    }

    pub fn fixed_total_valuation(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.fixed_total_valuation).collect()
    }

    pub fn recurring_total_valuation(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.recurring_total_valuation)
            .collect()
    }

    pub fn recurring_flow_valuation(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.recurring_flow_valuation)
            .collect()
    }

    pub fn is_retired(&self) -> Vec<bool> {
        self.records.iter().map(|r| r.is_retired).collect()
    }

    pub fn tax_paid(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.tax_paid).collect()
    }

    /// Total valuation in start-of-run money.
    pub fn real_total_valuation(&self) -> Vec<f64> {
        let inflation = 1.0 + self.inflation_rate_average_perc / 100.0;
        self.records
            .iter()
            .map(|r| r.total_valuation / inflation.powi(r.time as i32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(time: u32, total: f64, is_retired: bool) -> PeriodRecord {
        PeriodRecord {
            time,
            fixed: AllocationTable::default(),
            recurring: AllocationTable::default(),
            flow: AllocationTable::default(),
            contribution: AllocationTable::default(),
            fixed_total_valuation: total,
            recurring_total_valuation: 0.0,
            recurring_flow_valuation: 0.0,
            total_valuation: total,
            tax_paid: 0.0,
            is_retired,
        }
    }

    #[test]
    fn retirement_time_is_set_once() {
        let mut series = ResultTimeSeries::new(40, 0.0, 100.0, 4);
        series.push(record(0, 50.0, false));
        series.push(record(1, 120.0, true));
        series.push(record(2, 130.0, true));

        assert_eq!(series.retirement_time(), Some(1));
        assert_eq!(series.retirement_age(), Some(41));
        assert_eq!(series.is_retired(), vec![false, true, true]);
        assert_eq!(series.ages(), vec![40, 41, 42]);
    }

    #[test]
    fn retirement_age_is_absent_without_retirement() {
        let mut series = ResultTimeSeries::new(40, 0.0, 100.0, 2);
        series.push(record(0, 50.0, false));
        series.push(record(1, 60.0, false));
        assert_eq!(series.retirement_time(), None);
        assert_eq!(series.retirement_age(), None);
    }

    #[test]
    fn real_valuation_deflates_by_inflation() {
        let mut series = ResultTimeSeries::new(30, 10.0, 1.0, 2);
        series.push(record(0, 100.0, false));
        series.push(record(1, 110.0, false));
        let real = series.real_total_valuation();
        assert!((real[0] - 100.0).abs() <= 1e-9);
        assert!((real[1] - 100.0).abs() <= 1e-9);
    }
}
