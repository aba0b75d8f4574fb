use crate::decode::dtype::DTypeTable;
use crate::error::ConfigError;

/// Hard cap on tensor rank a profile may request.
pub const MAX_RANK_LIMIT: usize = 8;

/// Largest element count any decoded tensor may reach (16 Mi).
pub const MAX_ELEMENTS: usize = 16 * 1024 * 1024;

/// How tensor values are produced once shape and dtype are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    /// Copy whole elements from the input; an element that no longer fits
    /// is zero and consumes nothing.
    #[default]
    Elementwise,
    /// Copy as many raw bytes as are left in one go and zero the tail. A
    /// trailing partial element is consumed.
    Contiguous,
    /// Ignore the input for values and draw them from a seeded generator.
    Random { seed: u64 },
}

/// Decoding bounds shared by every harness of one family.
///
/// Use [`Profile::tensorflow`], [`Profile::torch`], or
/// [`Profile::builder`] for anything custom.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    min_rank: usize,
    max_rank: usize,
    min_dim: u64,
    max_dim: u64,
    dtypes: DTypeTable,
    fill_mode: FillMode,
}

impl Profile {
    /// TensorFlow raw-op harness bounds: rank `[0, 4]`, dims `[1, 10]`.
    pub fn tensorflow() -> Self {
        Self {
            min_rank: 0,
            max_rank: 4,
            min_dim: 1,
            max_dim: 10,
            dtypes: DTypeTable::tensorflow(),
            fill_mode: FillMode::Elementwise,
        }
    }

    /// PyTorch harness bounds: rank `[0, 4]`, dims `[1, 8]`, contiguous fill.
    pub fn torch() -> Self {
        Self {
            min_rank: 0,
            max_rank: 4,
            min_dim: 1,
            max_dim: 8,
            dtypes: DTypeTable::torch(),
            fill_mode: FillMode::Contiguous,
        }
    }

    /// Create a builder seeded with the TensorFlow bounds.
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder::default()
    }

    /// Start a builder from this profile's settings.
    pub fn to_builder(&self) -> ProfileBuilder {
        ProfileBuilder {
            min_rank: self.min_rank,
            max_rank: self.max_rank,
            min_dim: self.min_dim,
            max_dim: self.max_dim,
            dtypes: self.dtypes.clone(),
            fill_mode: self.fill_mode,
        }
    }

    pub fn min_rank(&self) -> usize {
        self.min_rank
    }

    pub fn max_rank(&self) -> usize {
        self.max_rank
    }

    pub fn min_dim(&self) -> u64 {
        self.min_dim
    }

    pub fn max_dim(&self) -> u64 {
        self.max_dim
    }

    pub fn dtypes(&self) -> &DTypeTable {
        &self.dtypes
    }

    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    /// Number of distinct rank values.
    pub(crate) fn rank_span(&self) -> usize {
        self.max_rank - self.min_rank + 1
    }

    /// Number of distinct dimension values.
    pub(crate) fn dim_span(&self) -> u64 {
        self.max_dim - self.min_dim + 1
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::tensorflow()
    }
}

/// Builder for [`Profile`].
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    min_rank: usize,
    max_rank: usize,
    min_dim: u64,
    max_dim: u64,
    dtypes: DTypeTable,
    fill_mode: FillMode,
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Profile::tensorflow().to_builder()
    }
}

impl ProfileBuilder {
    pub fn rank_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_rank = min;
        self.max_rank = max;
        self
    }

    pub fn dim_bounds(mut self, min: u64, max: u64) -> Self {
        self.min_dim = min;
        self.max_dim = max;
        self
    }

    pub fn dtypes(mut self, table: DTypeTable) -> Self {
        self.dtypes = table;
        self
    }

    pub fn fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    /// Build the `Profile`, checking that every shape it can produce is
    /// allocatable.
    pub fn build(self) -> Result<Profile, ConfigError> {
        if self.min_rank > self.max_rank {
            return Err(ConfigError::InvalidRankBounds {
                min: self.min_rank,
                max: self.max_rank,
            });
        }
        if self.max_rank > MAX_RANK_LIMIT {
            return Err(ConfigError::RankTooLarge {
                max: self.max_rank,
                limit: MAX_RANK_LIMIT,
            });
        }
        if self.min_dim == 0 || self.min_dim > self.max_dim {
            return Err(ConfigError::InvalidDimBounds {
                min: self.min_dim,
                max: self.max_dim,
            });
        }
        // max_rank <= 8 so the exponent always fits in u32.
        let largest = self.max_dim.checked_pow(self.max_rank as u32);
        if !matches!(largest, Some(n) if n <= MAX_ELEMENTS as u64) {
            return Err(ConfigError::ElementBudgetExceeded {
                limit: MAX_ELEMENTS,
            });
        }
        Ok(Profile {
            min_rank: self.min_rank,
            max_rank: self.max_rank,
            min_dim: self.min_dim,
            max_dim: self.max_dim,
            dtypes: self.dtypes,
            fill_mode: self.fill_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_pass_validation() {
        for preset in [Profile::tensorflow(), Profile::torch()] {
            let rebuilt = preset.to_builder().build().unwrap();
            assert_eq!(rebuilt, preset);
        }
    }

    #[test]
    fn rejects_inverted_rank_bounds() {
        let err = Profile::builder().rank_bounds(3, 2).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidRankBounds { min: 3, max: 2 });
    }

    #[test]
    fn rejects_rank_above_limit() {
        let err = Profile::builder()
            .rank_bounds(0, MAX_RANK_LIMIT + 1)
            .dim_bounds(1, 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RankTooLarge { .. }));
    }

    #[test]
    fn rejects_zero_min_dim() {
        let err = Profile::builder().dim_bounds(0, 4).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidDimBounds { min: 0, max: 4 });
    }

    #[test]
    fn rejects_oversized_tensors() {
        // 100^4 = 10^8 elements, above the 16 Mi cap.
        let err = Profile::builder().dim_bounds(1, 100).build().unwrap_err();
        assert!(matches!(err, ConfigError::ElementBudgetExceeded { .. }));

        // Overflowing u64 must also be caught rather than wrap.
        let err = Profile::builder()
            .rank_bounds(0, 8)
            .dim_bounds(1, u64::MAX)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ElementBudgetExceeded { .. }));
    }

    #[test]
    fn builder_overrides_fill_mode() {
        let profile = Profile::builder()
            .fill_mode(FillMode::Random { seed: 7 })
            .build()
            .unwrap();
        assert_eq!(profile.fill_mode(), FillMode::Random { seed: 7 });
        assert_eq!(profile.dim_span(), 10);
        assert_eq!(profile.rank_span(), 5);
    }
}
