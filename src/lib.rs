pub mod decode;
pub mod error;
pub mod harness;
pub mod profile;

// Re-export key types at crate root for convenience.
pub use decode::dtype::{DType, DTypeTable};
pub use decode::tensor::{Element, ShapeSpec, TensorBuffer, TensorData};
pub use decode::ByteCursor;
pub use error::{ConfigError, Error, Result, ShapeError, TargetError};
pub use harness::record::InputRecorder;
pub use harness::{Harness, HarnessConfig, Verdict};
pub use profile::{FillMode, Profile};
