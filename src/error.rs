use std::io;

/// Errors from building a decode [`Profile`](crate::profile::Profile) or
/// harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid rank bounds: min {min} > max {max}")]
    InvalidRankBounds { min: usize, max: usize },

    #[error("max rank {max} exceeds limit {limit}")]
    RankTooLarge { max: usize, limit: usize },

    #[error("invalid dimension bounds: expected 1 <= min ({min}) <= max ({max})")]
    InvalidDimBounds { min: u64, max: u64 },

    #[error("largest tensor would hold more than {limit} elements")]
    ElementBudgetExceeded { limit: usize },

    #[error("dtype table is empty")]
    EmptyDTypeTable,

    #[error("dtype table modulus {modulus} is smaller than its {entries} entries")]
    DTypeModulusTooSmall { modulus: usize, entries: usize },
}

/// Errors from building a shape by hand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("tensor shape overflow: dimensions produce more elements than representable")]
    Overflow,

    #[error("tensor shape holds {count} elements, more than the limit of {limit}")]
    TooLarge { count: usize, limit: usize },
}

/// Outcome of a fuzz target that did not complete normally.
///
/// `Rejected` is the target refusing the input the way a library rejects bad
/// arguments; `Fault` is anything unexpected that deserves the fuzzer's
/// attention.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("target rejected input: {0}")]
    Rejected(String),

    #[error("target fault: {0}")]
    Fault(String),
}

impl TargetError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn fault(msg: impl Into<String>) -> Self {
        Self::Fault(msg.into())
    }

    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
