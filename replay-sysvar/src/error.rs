use thiserror::Error;

/// spec.md §9 Design Note "Sysvar panic on not present": the original reaches
/// for a process-global assumption that the sysvar account exists. Here a
/// missing or malformed sysvar is always a typed `Result`, never a panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SysvarError {
    #[error("sysvar {0} account not present in the account loader")]
    Missing(&'static str),

    #[error("sysvar {0} account could not be decoded: {1}")]
    Decode(&'static str, String),
}
