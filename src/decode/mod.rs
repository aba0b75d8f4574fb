//! Exhaustion-safe decoding of fuzzer input.
//!
//! A [`ByteCursor`] walks a byte slice and hands out ranks, shapes, dtypes,
//! scalar parameters and whole tensors. Every read is total: when the input
//! runs out the cursor substitutes a fixed default and leaves the offset at
//! the end, so a harness always gets something it can allocate.

pub mod dtype;
pub mod tensor;

use std::ops::RangeInclusive;

use bytes::{BufMut, Bytes, BytesMut};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use self::dtype::DType;
use self::tensor::{ShapeSpec, TensorBuffer, TensorData};
use crate::profile::{FillMode, Profile};

/// Longest string element, in characters.
pub const MAX_STRING_LEN: u8 = 10;

/// Fallback for [`ByteCursor::read_unit_interval`].
pub const DEFAULT_UNIT_VALUE: f64 = 0.5;

/// Read cursor over one fuzz input.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
    profile: &'a Profile,
    /// Random fills performed so far; keeps consecutive draws distinct.
    random_draws: u64,
}

macro_rules! read_le {
    ($name:ident, $t:ty, $size:expr) => {
        pub fn $name(&mut self) -> $t {
            match self.take::<$size>() {
                Some(raw) => <$t>::from_le_bytes(raw),
                None => <$t>::default(),
            }
        }
    };
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], profile: &'a Profile) -> Self {
        Self {
            data,
            offset: 0,
            profile,
            random_draws: 0,
        }
    }

    pub fn profile(&self) -> &'a Profile {
        self.profile
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread bytes.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    /// Next byte, or `0` once the input is exhausted.
    pub fn next_byte(&mut self) -> u8 {
        match self.data.get(self.offset) {
            Some(&b) => {
                self.offset += 1;
                b
            }
            None => 0,
        }
    }

    /// Consume exactly `n` bytes, or nothing if fewer remain.
    fn take_slice(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Some(slice)
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let slice = self.take_slice(N)?;
        let mut raw = [0u8; N];
        raw.copy_from_slice(slice);
        Some(raw)
    }

    /// Map a selector byte onto the profile's rank range.
    pub fn read_rank(&self, byte: u8) -> usize {
        byte as usize % self.profile.rank_span() + self.profile.min_rank()
    }

    pub fn next_rank(&mut self) -> usize {
        let byte = self.next_byte();
        self.read_rank(byte)
    }

    /// Decode `rank` dimensions (clamped to the profile's max rank).
    ///
    /// Each dimension takes 8 little-endian bytes normalized into the
    /// profile's dim range. Once fewer than 8 bytes remain, dimensions
    /// default to the minimum without consuming anything.
    pub fn read_shape(&mut self, rank: usize) -> ShapeSpec {
        let rank = rank.min(self.profile.max_rank());
        let span = self.profile.dim_span();
        let min = self.profile.min_dim();

        let dims = (0..rank)
            .map(|_| match self.take::<8>() {
                Some(raw) => min + i64::from_le_bytes(raw).unsigned_abs() % span,
                None => min,
            })
            .collect();
        ShapeSpec::from_bounded(dims)
    }

    pub fn read_dtype(&self, byte: u8) -> DType {
        self.profile.dtypes().select(byte)
    }

    pub fn next_dtype(&mut self) -> DType {
        let byte = self.next_byte();
        self.read_dtype(byte)
    }

    /// Odd byte means `true`; exhausted input means `false`.
    pub fn read_bool(&mut self) -> bool {
        self.next_byte() % 2 == 1
    }

    read_le!(read_i32, i32, 4);
    read_le!(read_u32, u32, 4);
    read_le!(read_i64, i64, 8);
    read_le!(read_u64, u64, 8);
    read_le!(read_f32, f32, 4);
    read_le!(read_f64, f64, 8);

    /// An `i64` folded into `range`. Empty ranges and exhausted input yield
    /// the range start.
    pub fn read_in_range(&mut self, range: RangeInclusive<i64>) -> i64 {
        let (lo, hi) = (*range.start(), *range.end());
        if hi < lo {
            return lo;
        }
        let Some(raw) = self.take::<8>() else {
            return lo;
        };
        let span = (hi as i128 - lo as i128 + 1) as u128;
        let step = i64::from_le_bytes(raw).unsigned_abs() as u128 % span;
        (lo as i128 + step as i128) as i64
    }

    /// Pick one of `choices` with a selector byte. Consumes nothing for an
    /// empty slice.
    pub fn read_choice<'c, T>(&mut self, choices: &'c [T]) -> Option<&'c T> {
        if choices.is_empty() {
            return None;
        }
        let index = self.next_byte() as usize % choices.len();
        choices.get(index)
    }

    /// A value in `[0, 1)` from the fractional part of an `f64`.
    pub fn read_unit_interval(&mut self) -> f64 {
        let Some(raw) = self.take::<8>() else {
            return DEFAULT_UNIT_VALUE;
        };
        let value = f64::from_le_bytes(raw);
        if !value.is_finite() {
            return DEFAULT_UNIT_VALUE;
        }
        value.abs().fract()
    }

    /// An axis index in `[0, rank)`, or `None` for scalars.
    pub fn read_dim_index(&mut self, rank: usize) -> Option<usize> {
        if rank == 0 {
            return None;
        }
        let raw = self.read_i64();
        Some((raw.unsigned_abs() % rank as u64) as usize)
    }

    /// Decode a full tensor: dtype byte, rank byte, shape, then values.
    pub fn read_tensor(&mut self) -> TensorBuffer {
        let dtype = self.next_dtype();
        let rank = self.next_rank();
        let shape = self.read_shape(rank);
        self.read_buffer(shape, dtype)
    }

    /// Allocate a tensor of the given shape and dtype and fill it.
    pub fn read_buffer(&mut self, shape: ShapeSpec, dtype: DType) -> TensorBuffer {
        let data = self.fill_data(&shape, dtype);
        tracing::debug!(
            ?dtype,
            dims = ?shape.dims(),
            offset = self.offset,
            remaining = self.remaining(),
            "decoded tensor"
        );
        TensorBuffer::from_parts(shape, dtype, data)
    }

    /// Refill an existing tensor's values from the cursor.
    pub fn fill(&mut self, buffer: &mut TensorBuffer) {
        buffer.data = self.fill_data(buffer.shape(), buffer.dtype());
    }

    fn fill_data(&mut self, shape: &ShapeSpec, dtype: DType) -> TensorData {
        let count = shape.num_elements();
        match (self.profile.fill_mode(), dtype.element_size()) {
            (FillMode::Random { seed }, _) => self.fill_random(seed, count, dtype),
            (_, None) => TensorData::Strings(self.fill_strings(count)),
            (FillMode::Elementwise, Some(size)) => {
                TensorData::Raw(normalize(dtype, self.fill_elementwise(count, size)))
            }
            (FillMode::Contiguous, Some(size)) => {
                TensorData::Raw(normalize(dtype, self.fill_contiguous(count, size)))
            }
        }
    }

    fn fill_elementwise(&mut self, count: usize, size: usize) -> BytesMut {
        let mut buf = BytesMut::zeroed(count * size);
        for element in buf.chunks_exact_mut(size) {
            // Remaining input only shrinks, so the first miss ends the copy.
            let Some(src) = self.take_slice(size) else {
                break;
            };
            element.copy_from_slice(src);
        }
        buf
    }

    fn fill_contiguous(&mut self, count: usize, size: usize) -> BytesMut {
        let needed = count * size;
        let mut buf = BytesMut::zeroed(needed);
        let n = needed.min(self.remaining());
        if let Some(src) = self.take_slice(n) {
            buf[..n].copy_from_slice(src);
        }
        buf
    }

    fn fill_strings(&mut self, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| {
                if self.is_exhausted() {
                    return String::new();
                }
                let len = self.next_byte() % MAX_STRING_LEN + 1;
                let n = (len as usize).min(self.remaining());
                self.take_slice(n)
                    .unwrap_or_default()
                    .iter()
                    .map(|&b| char::from(b % 128))
                    .collect()
            })
            .collect()
    }

    fn fill_random(&mut self, seed: u64, count: usize, dtype: DType) -> TensorData {
        let stream = seed
            ^ (self.offset as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ self.random_draws.rotate_left(32);
        self.random_draws += 1;
        let mut rng = StdRng::seed_from_u64(stream);

        let Some(size) = dtype.element_size() else {
            let strings: Vec<String> = (0..count)
                .map(|_| {
                    let len = rng.gen_range(1..=MAX_STRING_LEN);
                    (0..len)
                        .map(|_| char::from(rng.gen_range(0x20u8..0x7F)))
                        .collect::<String>()
                })
                .collect();
            return TensorData::Strings(strings);
        };

        let mut buf = BytesMut::with_capacity(count * size);
        for _ in 0..count {
            match dtype {
                DType::F32 => buf.put_f32_le(rng.gen()),
                DType::F64 => buf.put_f64_le(rng.gen()),
                DType::F16 => buf.put_slice(&half::f16::from_f32(rng.gen()).to_le_bytes()),
                DType::BF16 => buf.put_slice(&half::bf16::from_f32(rng.gen()).to_le_bytes()),
                DType::Complex64 => {
                    buf.put_f32_le(rng.gen());
                    buf.put_f32_le(rng.gen());
                }
                DType::Complex128 => {
                    buf.put_f64_le(rng.gen());
                    buf.put_f64_le(rng.gen());
                }
                DType::Bool => buf.put_u8(rng.gen::<bool>() as u8),
                _ => {
                    let mut raw = [0u8; 8];
                    rng.fill_bytes(&mut raw[..size]);
                    buf.put_slice(&raw[..size]);
                }
            }
        }
        TensorData::Raw(buf.freeze())
    }
}

/// Bools are stored as `0`/`1` whatever byte they were copied from.
fn normalize(dtype: DType, mut buf: BytesMut) -> Bytes {
    if dtype == DType::Bool {
        for b in buf.iter_mut() {
            *b = (*b != 0) as u8;
        }
    }
    buf.freeze()
}
