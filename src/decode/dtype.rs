use crate::error::ConfigError;

/// Tensor element types a harness can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
    F16,
    BF16,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Bool,
    Complex64,
    Complex128,
    QInt8,
    QUInt8,
    QInt16,
    QUInt16,
    QInt32,
    String,
}

impl DType {
    /// Size in bytes of one element, or `None` for the variable-width
    /// string type.
    pub const fn element_size(self) -> Option<usize> {
        match self {
            DType::U8 | DType::I8 | DType::Bool | DType::QInt8 | DType::QUInt8 => Some(1),
            DType::F16 | DType::BF16 | DType::I16 | DType::U16 | DType::QInt16 | DType::QUInt16 => {
                Some(2)
            }
            DType::F32 | DType::I32 | DType::U32 | DType::QInt32 => Some(4),
            DType::F64 | DType::I64 | DType::U64 | DType::Complex64 => Some(8),
            DType::Complex128 => Some(16),
            DType::String => None,
        }
    }

    pub const fn is_floating_point(self) -> bool {
        matches!(self, DType::F32 | DType::F64 | DType::F16 | DType::BF16)
    }

    pub const fn is_complex(self) -> bool {
        matches!(self, DType::Complex64 | DType::Complex128)
    }

    pub const fn is_quantized(self) -> bool {
        matches!(
            self,
            DType::QInt8 | DType::QUInt8 | DType::QInt16 | DType::QUInt16 | DType::QInt32
        )
    }

    pub const fn is_string(self) -> bool {
        matches!(self, DType::String)
    }
}

/// Ordered selector table mapping a raw byte to a [`DType`].
///
/// The harness families disagree on ordering and size, so the table is a
/// per-caller setting. A byte selects `entries[byte % modulus]`; slots past
/// the end of `entries` fall back to [`DType::F32`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DTypeTable {
    entries: Vec<DType>,
    modulus: usize,
}

impl DTypeTable {
    /// The fallback for unmapped selector slots.
    pub const FALLBACK: DType = DType::F32;

    /// A table whose modulus equals its length.
    pub fn new(entries: Vec<DType>) -> Result<Self, ConfigError> {
        let modulus = entries.len();
        Self::with_modulus(entries, modulus)
    }

    /// A table with extra unmapped slots that resolve to [`Self::FALLBACK`].
    pub fn with_modulus(entries: Vec<DType>, modulus: usize) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyDTypeTable);
        }
        if modulus < entries.len() {
            return Err(ConfigError::DTypeModulusTooSmall {
                modulus,
                entries: entries.len(),
            });
        }
        Ok(Self { entries, modulus })
    }

    /// Full TensorFlow raw-op table, strings and quantized types included.
    pub fn tensorflow() -> Self {
        use DType::*;
        Self {
            entries: vec![
                F32, F64, I32, U8, I16, I8, String, Complex64, I64, Bool, QInt8, QUInt8, QInt32,
                BF16, QInt16, QUInt16, U16, Complex128, F16, U32, U64,
            ],
            modulus: 21,
        }
    }

    /// TensorFlow table for numeric-only ops: no strings or bools, and one
    /// unmapped slot.
    pub fn tensorflow_numeric() -> Self {
        use DType::*;
        Self {
            entries: vec![
                F32, F64, I32, U8, I16, I8, Complex64, I64, QInt8, QUInt8, QInt32, BF16, QInt16,
                QUInt16, U16, Complex128, F16, U32, U64,
            ],
            modulus: 20,
        }
    }

    /// PyTorch scalar types supported by the tensor factory.
    pub fn torch() -> Self {
        use DType::*;
        Self {
            entries: vec![F32, F64, F16, BF16, Complex64, Complex128, I8, U8, I16, I32, I64, Bool],
            modulus: 12,
        }
    }

    pub fn select(&self, selector: u8) -> DType {
        let index = selector as usize % self.modulus;
        self.entries.get(index).copied().unwrap_or(Self::FALLBACK)
    }

    pub fn entries(&self) -> &[DType] {
        &self.entries
    }

    pub fn modulus(&self) -> usize {
        self.modulus
    }

    pub fn contains(&self, dtype: DType) -> bool {
        self.entries.contains(&dtype)
    }
}

impl Default for DTypeTable {
    fn default() -> Self {
        Self::tensorflow()
    }
}
