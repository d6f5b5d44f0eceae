use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::FireError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub yield_per_year_perc: f64,
}

/// Named yield profiles, e.g. `"STOCKS" -> 7%/yr`.
#[derive(Debug, Clone, Default)]
pub struct OpportunityCatalog {
    entries: BTreeMap<String, Opportunity>,
}

impl OpportunityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: impl Into<String>, yield_per_year_perc: f64) -> Self {
        self.insert(kind, yield_per_year_perc);
        self
    }

    pub fn insert(&mut self, kind: impl Into<String>, yield_per_year_perc: f64) {
        self.entries
            .insert(kind.into(), Opportunity { yield_per_year_perc });
    }

    pub fn get(&self, kind: &str) -> Result<&Opportunity, FireError> {
        self.entries
            .get(kind)
            .ok_or_else(|| FireError::UnknownOpportunityType(kind.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, f64)> for OpportunityCatalog {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (kind, yield_per_year_perc) in iter {
            catalog.insert(kind, yield_per_year_perc);
        }
        catalog
    }
}

/// One line of an allocation spec before it is joined against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSpec {
    pub share: f64,
    pub kind: String,
}

impl AllocationSpec {
    pub fn new(share: f64, kind: impl Into<String>) -> Self {
        Self {
            share,
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationLine {
    pub share: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub yield_per_year_perc: f64,
    pub value: f64,
}

impl AllocationLine {
    pub fn yearly_rate(&self) -> f64 {
        self.yield_per_year_perc / 100.0
    }

    pub fn monthly_rate(&self) -> f64 {
        self.yearly_rate() / 12.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AllocationTable {
    pub lines: Vec<AllocationLine>,
}

impl AllocationTable {
    pub fn total_value(&self) -> f64 {
        self.lines.iter().map(|line| line.value).sum()
    }

    pub fn total_share(&self) -> f64 {
        self.lines.iter().map(|line| line.share).sum()
    }

    /// `Σ(share × yield) / Σ(share)`.
    pub fn weighted_average_yield(&self) -> Result<f64, FireError> {
        let total_share = self.total_share();
        if total_share == 0.0 {
            return Err(FireError::DegenerateAllocation);
        }
        let weighted = self
            .lines
            .iter()
            .map(|line| line.share * line.yield_per_year_perc)
            .sum::<f64>();
        Ok(weighted / total_share)
    }

    /// Each line's share of the table's total share.
    pub fn share_weights(&self) -> Result<Vec<f64>, FireError> {
        let total_share = self.total_share();
        if total_share == 0.0 {
            return Err(FireError::DegenerateAllocation);
        }
        Ok(self
            .lines
            .iter()
            .map(|line| line.share / total_share)
            .collect())
    }

    /// Same lines, every value set to `value`.
    pub fn with_values(&self, value: f64) -> Self {
        Self {
            lines: self
                .lines
                .iter()
                .map(|line| AllocationLine {
                    value,
                    ..line.clone()
                })
                .collect(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    OneTime,
    Yearly,
    Monthly,
}

impl FromStr for Frequency {
    type Err = FireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONE_TIME" => Ok(Frequency::OneTime),
            "YEARLY" => Ok(Frequency::Yearly),
            "MONTHLY" => Ok(Frequency::Monthly),
            other => Err(FireError::UnknownEnumValue {
                kind: "frequency",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Frequency::OneTime => "ONE_TIME",
            Frequency::Yearly => "YEARLY",
            Frequency::Monthly => "MONTHLY",
        };
        f.write_str(label)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxMode {
    /// Gains are taxed every period as they accrue.
    TaxAllGains,
    /// Tax is deferred until money is withdrawn.
    TaxOnRealization,
}

impl FromStr for TaxMode {
    type Err = FireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TAX_ALL_GAINS" => Ok(TaxMode::TaxAllGains),
            "TAX_ON_REALIZATION" => Ok(TaxMode::TaxOnRealization),
            other => Err(FireError::UnknownEnumValue {
                kind: "tax_mode",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetItem {
    pub name: String,
    pub value: f64,
    pub frequency: Frequency,
}

impl TargetItem {
    pub fn new(name: impl Into<String>, value: f64, frequency: Frequency) -> Self {
        Self {
            name: name.into(),
            value,
            frequency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(share: f64, kind: &str, yield_per_year_perc: f64) -> AllocationLine {
        AllocationLine {
            share,
            kind: kind.to_string(),
            yield_per_year_perc,
            value: 0.0,
        }
    }

    #[test]
    fn catalog_lookup_fails_for_unknown_type() {
        let catalog = OpportunityCatalog::new().with("STOCKS", 7.0);
        assert_eq!(catalog.get("STOCKS").map(|o| o.yield_per_year_perc), Ok(7.0));
        assert_eq!(
            catalog.get("BONDS"),
            Err(FireError::UnknownOpportunityType("BONDS".to_string()))
        );
    }

    #[test]
    fn weighted_average_yield_uses_shares() {
        let table = AllocationTable {
            lines: vec![line(0.6, "A", 5.0), line(0.4, "B", 10.0)],
        };
        let avg = table.weighted_average_yield().expect("non-degenerate");
        assert!((avg - 7.0).abs() <= 1e-12);
        assert_eq!(table.weighted_average_yield(), Ok(avg));
    }

    #[test]
    fn weighted_average_yield_rejects_zero_shares() {
        let table = AllocationTable {
            lines: vec![line(0.0, "A", 5.0), line(0.0, "B", 10.0)],
        };
        assert_eq!(
            table.weighted_average_yield(),
            Err(FireError::DegenerateAllocation)
        );
        assert_eq!(table.share_weights(), Err(FireError::DegenerateAllocation));
    }

    #[test]
    fn share_weights_normalise_partial_allocations() {
        let table = AllocationTable {
            lines: vec![line(0.3, "A", 5.0), line(0.1, "B", 10.0)],
        };
        let weights = table.share_weights().expect("non-degenerate");
        assert!((weights[0] - 0.75).abs() <= 1e-12);
        assert!((weights[1] - 0.25).abs() <= 1e-12);
    }

    #[test]
    fn enum_parsing_fails_fast_on_unknown_strings() {
        assert_eq!("MONTHLY".parse::<Frequency>(), Ok(Frequency::Monthly));
        assert_eq!("TAX_ALL_GAINS".parse::<TaxMode>(), Ok(TaxMode::TaxAllGains));
        assert!(matches!(
            "WEEKLY".parse::<Frequency>(),
            Err(FireError::UnknownEnumValue { kind: "frequency", .. })
        ));
        assert!(matches!(
            "monthly".parse::<Frequency>(),
            Err(FireError::UnknownEnumValue { .. })
        ));
        assert!(matches!(
            "TAX_NOTHING".parse::<TaxMode>(),
            Err(FireError::UnknownEnumValue { kind: "tax_mode", .. })
        ));
    }
}
