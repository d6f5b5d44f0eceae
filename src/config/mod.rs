//! Scenario records as they appear in the JSON scenario files.
//!
//! Each file maps a scenario name to one settings record, e.g.
//!
//! ```json
//! { "aggressive": { "investment_opportunities": { "STOCKS": { "yield_per_year_perc": 7 } }, ... } }
//! ```
//!
//! Records are converted into core types with `build`, which is where unknown
//! opportunity types and enum strings are rejected.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{
    AllocationSpec, EconomicConditions, FireError, OpportunityCatalog, Portfolio, TargetItem,
    TargetProfile,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no {kind} scenario named {name:?} (available: {available})")]
    MissingScenario {
        kind: &'static str,
        name: String,
        available: String,
    },

    #[error("max_periods must be between 1 and {max}, got {0}", max = MAX_PERIODS)]
    InvalidMaxPeriods(u32),

    #[error(transparent)]
    Model(#[from] FireError),
}

/// Upper bound accepted from callers for the number of simulated years.
pub const MAX_PERIODS: u32 = 200;

pub const DEFAULT_MAX_PERIODS: u32 = 60;

pub fn validate_max_periods(max_periods: u32) -> Result<u32, ConfigError> {
    if max_periods == 0 || max_periods > MAX_PERIODS {
        return Err(ConfigError::InvalidMaxPeriods(max_periods));
    }
    Ok(max_periods)
}

pub trait ScenarioKind: DeserializeOwned {
    const KIND: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct OpportunitySettings {
    pub yield_per_year_perc: f64,
}

/// Either `[share, "TYPE"]` or `{ "share": .., "type": .. }`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AllocationEntry {
    Pair(f64, String),
    Line {
        share: f64,
        #[serde(rename = "type")]
        kind: String,
    },
}

impl From<&AllocationEntry> for AllocationSpec {
    fn from(entry: &AllocationEntry) -> Self {
        match entry {
            AllocationEntry::Pair(share, kind) | AllocationEntry::Line { share, kind } => {
                AllocationSpec::new(*share, kind.clone())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InvestmentSettings {
    pub investment_opportunities: BTreeMap<String, OpportunitySettings>,
    #[serde(default)]
    pub investment_structure_fix: Vec<AllocationEntry>,
    #[serde(default)]
    pub investment_structure_var: Vec<AllocationEntry>,
    #[serde(default)]
    pub initial_assets: f64,
    #[serde(default)]
    pub investments_monthly: f64,
    #[serde(default)]
    pub investment_var_yearly_growth_perc: f64,
}

impl ScenarioKind for InvestmentSettings {
    const KIND: &'static str = "investment";
}

impl InvestmentSettings {
    pub fn catalog(&self) -> OpportunityCatalog {
        self.investment_opportunities
            .iter()
            .map(|(kind, opportunity)| (kind.clone(), opportunity.yield_per_year_perc))
            .collect()
    }

    pub fn build(&self) -> Result<Portfolio, FireError> {
        let fixed = self
            .investment_structure_fix
            .iter()
            .map(AllocationSpec::from)
            .collect::<Vec<_>>();
        let recurring = self
            .investment_structure_var
            .iter()
            .map(AllocationSpec::from)
            .collect::<Vec<_>>();
        Portfolio::new(
            &self.catalog(),
            &fixed,
            &recurring,
            self.initial_assets,
            self.investments_monthly,
            self.investment_var_yearly_growth_perc,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TargetItemSettings {
    pub value: f64,
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TargetSettings {
    /// Kept in file order.
    #[serde(with = "ordered_items")]
    pub target_value_arr: Vec<(String, TargetItemSettings)>,
    pub withdrawal_rate_perc: f64,
}

impl ScenarioKind for TargetSettings {
    const KIND: &'static str = "target";
}

impl TargetSettings {
    pub fn build(&self) -> Result<TargetProfile, FireError> {
        let items = self
            .target_value_arr
            .iter()
            .map(|(name, item)| Ok(TargetItem::new(name.clone(), item.value, item.frequency.parse()?)))
            .collect::<Result<Vec<_>, FireError>>()?;
        TargetProfile::new(items, self.withdrawal_rate_perc)
    }
}

/// A JSON object read into `(key, value)` pairs in document order.
mod ordered_items {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, V>(items: &Vec<(String, V)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(items.len()))?;
        for (name, item) in items {
            map.serialize_entry(name, item)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct ItemsVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for ItemsVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of named items")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, item)) = access.next_entry::<String, V>()? {
                    if items.iter().any(|(seen, _): &(String, V)| *seen == name) {
                        return Err(serde::de::Error::custom(format!("duplicate item {name:?}")));
                    }
                    items.push((name, item));
                }
                Ok(items)
            }
        }

        deserializer.deserialize_map(ItemsVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConditionsSettings {
    pub average_inflation_rate_perc: f64,
    pub capital_tax_rate_perc: f64,
    pub tax_mode: String,
    pub start_age: u32,
}

impl ScenarioKind for ConditionsSettings {
    const KIND: &'static str = "conditions";
}

impl ConditionsSettings {
    pub fn build(&self) -> Result<EconomicConditions, FireError> {
        EconomicConditions::new(
            self.average_inflation_rate_perc,
            self.capital_tax_rate_perc,
            self.tax_mode.parse()?,
            self.start_age,
        )
    }
}

/// Named scenarios of one kind, loaded from a single file.
#[derive(Debug, Clone)]
pub struct ScenarioSet<T> {
    scenarios: BTreeMap<String, T>,
}

impl<T: ScenarioKind> ScenarioSet<T> {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let scenarios = serde_json::from_str(json)?;
        Ok(Self { scenarios })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_json_str(&json)?;
        tracing::debug!(
            kind = T::KIND,
            path = %path.display(),
            count = set.scenarios.len(),
            "loaded scenarios"
        );
        Ok(set)
    }

    pub fn select(&self, name: &str) -> Result<&T, ConfigError> {
        self.scenarios
            .get(name)
            .ok_or_else(|| ConfigError::MissingScenario {
                kind: T::KIND,
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.scenarios.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.scenarios.iter().map(|(name, s)| (name.as_str(), s))
    }
}
