//! Glue between a fuzzing engine and one target call.
//!
//! [`Harness::run`] applies the minimum-size gate, hands the target a
//! [`ByteCursor`], and folds the target's result into a [`Verdict`].

pub mod record;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::decode::ByteCursor;
use crate::error::{Error, TargetError};
use crate::profile::Profile;

use self::record::InputRecorder;

/// Inputs shorter than this never reach the target by default.
pub const DEFAULT_MIN_INPUT_LEN: usize = 2;

/// Default number of iterations between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// What the fuzzing engine should do with an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep fuzzing; the input may join the corpus.
    Continue,
    /// Drop the input from the corpus.
    Discard,
}

impl Verdict {
    /// libFuzzer return code: `0` or `-1`.
    pub const fn code(self) -> i32 {
        match self {
            Verdict::Continue => 0,
            Verdict::Discard => -1,
        }
    }

    pub const fn is_discard(self) -> bool {
        matches!(self, Verdict::Discard)
    }
}

impl From<Verdict> for i32 {
    fn from(verdict: Verdict) -> Self {
        verdict.code()
    }
}

/// Configuration for a [`Harness`].
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Inputs shorter than this return [`Verdict::Continue`] untouched (default: 2).
    pub min_input_len: usize,

    /// Decoding bounds handed to every cursor (default: TensorFlow).
    pub profile: Profile,

    /// Log progress every this many runs; `0` disables (default: 10 000).
    pub progress_interval: u64,

    /// Directory for inputs that made the target fault (default: none).
    pub record_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            min_input_len: DEFAULT_MIN_INPUT_LEN,
            profile: Profile::tensorflow(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            record_dir: None,
        }
    }
}

impl HarnessConfig {
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::default()
    }
}

/// Builder for [`HarnessConfig`].
#[derive(Debug, Clone, Default)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    pub fn min_input_len(mut self, len: usize) -> Self {
        self.config.min_input_len = len;
        self
    }

    pub fn profile(mut self, profile: Profile) -> Self {
        self.config.profile = profile;
        self
    }

    pub fn progress_interval(mut self, interval: u64) -> Self {
        self.config.progress_interval = interval;
        self
    }

    pub fn record_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.record_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> HarnessConfig {
        self.config
    }
}

/// Runs one target per fuzz input.
///
/// Meant to live in a `static` next to the fuzz target, so the iteration
/// counter is atomic.
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
    recorder: Option<InputRecorder>,
    iterations: AtomicU64,
}

impl Harness {
    /// Create a harness, opening the record directory if one is configured.
    pub fn new(config: HarnessConfig) -> Result<Self, Error> {
        let recorder = config
            .record_dir
            .as_ref()
            .map(InputRecorder::new)
            .transpose()?;
        Ok(Self {
            config,
            recorder,
            iterations: AtomicU64::new(0),
        })
    }

    /// A harness with default settings and the given profile.
    pub fn with_profile(profile: Profile) -> Self {
        Self {
            config: HarnessConfig {
                profile,
                ..Default::default()
            },
            recorder: None,
            iterations: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn recorder(&self) -> Option<&InputRecorder> {
        self.recorder.as_ref()
    }

    /// Inputs seen so far, gated ones included.
    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    /// Decode-and-invoke for one input.
    ///
    /// Panics inside `target` are not caught.
    pub fn run<F>(&self, data: &[u8], target: F) -> Verdict
    where
        F: FnOnce(&mut ByteCursor<'_>) -> Result<(), TargetError>,
    {
        let iteration = self.iterations.fetch_add(1, Ordering::Relaxed) + 1;
        let interval = self.config.progress_interval;
        if interval != 0 && iteration % interval == 0 {
            tracing::info!(iterations = iteration, "fuzzing progress");
        }

        if data.len() < self.config.min_input_len {
            return Verdict::Continue;
        }

        let mut cursor = ByteCursor::new(data, &self.config.profile);
        match target(&mut cursor) {
            Ok(()) => Verdict::Continue,
            Err(TargetError::Rejected(reason)) => {
                tracing::debug!(iteration, %reason, "target rejected input");
                Verdict::Continue
            }
            Err(TargetError::Fault(message)) => {
                tracing::warn!(
                    iteration,
                    len = data.len(),
                    consumed = cursor.offset(),
                    error = %message,
                    "target fault, discarding input"
                );
                self.record(data, &message);
                Verdict::Discard
            }
        }
    }

    fn record(&self, data: &[u8], message: &str) {
        let Some(recorder) = &self.recorder else {
            return;
        };
        match recorder.record(data, message) {
            Ok(path) => tracing::debug!(path = %path.display(), "recorded faulting input"),
            Err(e) => tracing::warn!(error = %e, "failed to record faulting input"),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::with_profile(Profile::tensorflow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_codes() {
        assert_eq!(Verdict::Continue.code(), 0);
        assert_eq!(Verdict::Discard.code(), -1);
        assert_eq!(i32::from(Verdict::Discard), -1);
        assert!(Verdict::Discard.is_discard());
        assert!(!Verdict::Continue.is_discard());
    }

    #[test]
    fn short_input_skips_target() {
        let harness = Harness::default();
        let mut called = false;
        let verdict = harness.run(&[1], |_| {
            called = true;
            Ok(())
        });
        assert_eq!(verdict, Verdict::Continue);
        assert!(!called);
        assert_eq!(harness.iterations(), 1);
    }

    #[test]
    fn rejection_continues_and_fault_discards() {
        let harness = Harness::default();
        let verdict = harness.run(&[0, 0, 0], |_| Err(TargetError::rejected("shape mismatch")));
        assert_eq!(verdict, Verdict::Continue);

        let verdict = harness.run(&[0, 0, 0], |_| Err(TargetError::fault("boom")));
        assert_eq!(verdict, Verdict::Discard);
        assert_eq!(harness.iterations(), 2);
    }

    #[test]
    fn target_sees_configured_profile() {
        let harness = Harness::with_profile(Profile::torch());
        let verdict = harness.run(&[11, 0], |cursor| {
            assert_eq!(cursor.next_dtype(), crate::DType::Bool);
            Ok(())
        });
        assert_eq!(verdict, Verdict::Continue);
    }

    #[test]
    fn builder_sets_fields() {
        let config = HarnessConfig::builder()
            .min_input_len(16)
            .progress_interval(0)
            .profile(Profile::torch())
            .record_dir("/tmp/faults")
            .build();
        assert_eq!(config.min_input_len, 16);
        assert_eq!(config.progress_interval, 0);
        assert_eq!(config.profile, Profile::torch());
        assert_eq!(config.record_dir, Some(PathBuf::from("/tmp/faults")));
    }
}
