use bytes::Bytes;

use super::dtype::DType;
use crate::error::ShapeError;
use crate::profile::MAX_ELEMENTS;

/// Ordered tensor dimensions with a cached element count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeSpec {
    dims: Vec<u64>,
    num_elements: usize,
}

impl ShapeSpec {
    /// The rank-0 shape (one element).
    pub fn scalar() -> Self {
        Self {
            dims: Vec::new(),
            num_elements: 1,
        }
    }

    /// Build a shape by hand.
    ///
    /// The element count must fit in `usize` and stay within
    /// [`MAX_ELEMENTS`], so every shape can back a tensor of any dtype.
    pub fn new(dims: Vec<u64>) -> Result<Self, ShapeError> {
        let num_elements = dims
            .iter()
            .try_fold(1usize, |acc, &dim| {
                usize::try_from(dim).ok().and_then(|d| acc.checked_mul(d))
            })
            .ok_or(ShapeError::Overflow)?;
        if num_elements > MAX_ELEMENTS {
            return Err(ShapeError::TooLarge {
                count: num_elements,
                limit: MAX_ELEMENTS,
            });
        }
        Ok(Self { dims, num_elements })
    }

    /// Shape whose dimensions come from a validated profile, whose element
    /// budget already bounds the count by [`MAX_ELEMENTS`].
    pub(crate) fn from_bounded(dims: Vec<u64>) -> Self {
        let num_elements = dims
            .iter()
            .fold(1usize, |acc, &dim| acc.saturating_mul(dim as usize));
        Self { dims, num_elements }
    }

    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }
}

impl Default for ShapeSpec {
    fn default() -> Self {
        Self::scalar()
    }
}

/// Backing storage of a [`TensorBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TensorData {
    /// Little-endian element bytes for every fixed-width dtype.
    Raw(Bytes),
    /// One entry per element for [`DType::String`].
    Strings(Vec<String>),
}

/// A decoded tensor: shape, dtype and values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorBuffer {
    shape: ShapeSpec,
    dtype: DType,
    pub(crate) data: TensorData,
}

impl TensorBuffer {
    /// A tensor whose elements all hold the dtype's zero value.
    pub fn zeroed(shape: ShapeSpec, dtype: DType) -> Self {
        let count = shape.num_elements();
        let data = match dtype.element_size() {
            Some(size) => TensorData::Raw(Bytes::from(vec![0u8; count * size])),
            None => TensorData::Strings(vec![String::new(); count]),
        };
        Self { shape, dtype, data }
    }

    pub(crate) fn from_parts(shape: ShapeSpec, dtype: DType, data: TensorData) -> Self {
        Self { shape, dtype, data }
    }

    pub fn shape(&self) -> &ShapeSpec {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Raw element bytes, or `None` for string tensors.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.data {
            TensorData::Raw(bytes) => Some(&bytes[..]),
            TensorData::Strings(_) => None,
        }
    }

    /// String elements, or `None` for fixed-width tensors.
    pub fn strings(&self) -> Option<&[String]> {
        match &self.data {
            TensorData::Strings(strings) => Some(strings.as_slice()),
            TensorData::Raw(_) => None,
        }
    }

    /// Typed copy of the elements. Returns `None` when `T` does not match
    /// the tensor's dtype.
    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        if !T::DTYPES.contains(&self.dtype) {
            return None;
        }
        let bytes = self.raw_bytes()?;
        Some(bytes.chunks_exact(T::SIZE).map(T::from_le_slice).collect())
    }
}

/// Rust types that a fixed-width tensor can be read back as.
pub trait Element: Sized {
    const SIZE: usize;
    /// Dtypes whose element layout matches `Self`.
    const DTYPES: &'static [DType];

    /// Decode one element; `bytes` is exactly `SIZE` long.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($t:ty, $size:expr, [$($dtype:ident),+]) => {
        impl Element for $t {
            const SIZE: usize = $size;
            const DTYPES: &'static [DType] = &[$(DType::$dtype),+];

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; $size];
                raw.copy_from_slice(bytes);
                <$t>::from_le_bytes(raw)
            }
        }
    };
}

impl_element!(f32, 4, [F32]);
impl_element!(f64, 8, [F64]);
impl_element!(half::f16, 2, [F16]);
impl_element!(half::bf16, 2, [BF16]);
impl_element!(i8, 1, [I8, QInt8]);
impl_element!(u8, 1, [U8, QUInt8]);
impl_element!(i16, 2, [I16, QInt16]);
impl_element!(u16, 2, [U16, QUInt16]);
impl_element!(i32, 4, [I32, QInt32]);
impl_element!(u32, 4, [U32]);
impl_element!(i64, 8, [I64]);
impl_element!(u64, 8, [U64]);

impl Element for bool {
    const SIZE: usize = 1;
    const DTYPES: &'static [DType] = &[DType::Bool];

    fn from_le_slice(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_has_one_element() {
        let shape = ShapeSpec::scalar();
        assert!(shape.is_scalar());
        assert_eq!(shape.rank(), 0);
        assert_eq!(shape.num_elements(), 1);
    }

    #[test]
    fn hand_built_shape_counts_elements() {
        let shape = ShapeSpec::new(vec![2, 3, 4]).unwrap();
        assert_eq!(shape.num_elements(), 24);
        assert_eq!(shape.dims(), &[2, 3, 4]);
    }

    #[test]
    fn hand_built_shape_overflow() {
        let err = ShapeSpec::new(vec![u64::MAX, 2]).unwrap_err();
        assert_eq!(err, ShapeError::Overflow);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn hand_built_shape_over_budget() {
        let err = ShapeSpec::new(vec![1u64 << 61]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::TooLarge {
                count: 1usize << 61,
                limit: MAX_ELEMENTS,
            }
        );

        let err = ShapeSpec::new(vec![4096, 4097]).unwrap_err();
        assert!(matches!(err, ShapeError::TooLarge { .. }));
    }

    #[test]
    fn largest_hand_built_shape_fits_widest_dtype() {
        let shape = ShapeSpec::new(vec![4096, 4096]).unwrap();
        assert_eq!(shape.num_elements(), MAX_ELEMENTS);
        let size = DType::Complex128.element_size().unwrap();
        assert!(shape.num_elements().checked_mul(size).is_some());
    }

    #[test]
    fn zero_sized_dim_is_allowed_by_hand() {
        let shape = ShapeSpec::new(vec![4, 0]).unwrap();
        let tensor = TensorBuffer::zeroed(shape, DType::F32);
        assert_eq!(tensor.num_elements(), 0);
        assert_eq!(tensor.raw_bytes().unwrap().len(), 0);
    }

    #[test]
    fn zeroed_string_tensor() {
        let shape = ShapeSpec::new(vec![3]).unwrap();
        let tensor = TensorBuffer::zeroed(shape, DType::String);
        assert_eq!(tensor.strings().unwrap(), &["", "", ""]);
        assert!(tensor.raw_bytes().is_none());
    }

    #[test]
    fn typed_view_checks_dtype() {
        let shape = ShapeSpec::new(vec![2]).unwrap();
        let data = TensorData::Raw(Bytes::from_static(&[1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]));
        let tensor = TensorBuffer::from_parts(shape, DType::I32, data);
        assert_eq!(tensor.to_vec::<i32>().unwrap(), vec![1, -1]);
        assert!(tensor.to_vec::<f32>().is_none());
        assert!(tensor.to_vec::<u32>().is_none());
    }

    #[test]
    fn quantized_reads_as_underlying_int() {
        let shape = ShapeSpec::new(vec![2]).unwrap();
        let data = TensorData::Raw(Bytes::from_static(&[0x80, 0x7F]));
        let tensor = TensorBuffer::from_parts(shape, DType::QInt8, data);
        assert_eq!(tensor.to_vec::<i8>().unwrap(), vec![-128, 127]);
    }
}
