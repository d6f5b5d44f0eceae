mod conditions;
mod engine;
mod error;
mod portfolio;
mod series;
mod target;
mod types;

pub use conditions::EconomicConditions;
pub use engine::{Simulation, run_simulation};
pub use error::FireError;
pub use portfolio::{Portfolio, assemble, weighted_average_yield};
pub use series::{PeriodRecord, ResultTimeSeries};
pub use target::{TargetProfile, TargetShare};
pub use types::{
    AllocationLine, AllocationSpec, AllocationTable, Frequency, Opportunity, OpportunityCatalog,
    TargetItem, TaxMode,
};
