/// Failures raised while assembling or running a projection.
///
/// All of them are deterministic functions of the input; retrying never helps.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FireError {
    #[error("unknown investment opportunity type: {0}")]
    UnknownOpportunityType(String),

    #[error("allocation shares sum to zero")]
    DegenerateAllocation,

    #[error("withdrawal rate must be > 0, got {0}%")]
    InvalidWithdrawalRate(f64),

    #[error("capital tax rate must be in [0, 100), got {0}%")]
    InvalidTaxRate(f64),

    #[error("unknown {kind} value: {value}")]
    UnknownEnumValue { kind: &'static str, value: String },
}
