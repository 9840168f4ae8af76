use core::fmt::{Debug, Display};

/// Scalar type that can live in device memory and be manipulated by kernels.
///
/// Elements are stored in atomic 64-bit cells while a kernel runs, so every element must be able
/// to round-trip through its bit pattern.
pub trait CubeElement:
    bytemuck::Pod + num_traits::Float + Debug + Display + Send + Sync + 'static
{
    /// Name of the element, used in kernel ids and logs.
    fn type_name() -> &'static str;

    /// Bit pattern of the value, zero extended to 64 bits.
    fn to_bits_u64(self) -> u64;

    /// Value from a bit pattern produced by [to_bits_u64](CubeElement::to_bits_u64).
    fn from_bits_u64(bits: u64) -> Self;

    /// Reinterpret raw bytes as a slice of elements.
    ///
    /// # Panics
    ///
    /// When the bytes aren't aligned or sized for the element type.
    fn from_bytes(bytes: &[u8]) -> &[Self] {
        bytemuck::cast_slice(bytes)
    }

    /// Raw bytes of a slice of elements.
    fn as_bytes(elems: &[Self]) -> &[u8] {
        bytemuck::cast_slice(elems)
    }

    /// Integer conversion used by kernels and tests to build exact values.
    fn from_int(value: i64) -> Self {
        <Self as num_traits::NumCast>::from(value).unwrap_or_else(Self::nan)
    }
}

impl CubeElement for f32 {
    fn type_name() -> &'static str {
        "f32"
    }

    fn to_bits_u64(self) -> u64 {
        self.to_bits() as u64
    }

    fn from_bits_u64(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
}

impl CubeElement for f64 {
    fn type_name() -> &'static str {
        "f64"
    }

    fn to_bits_u64(self) -> u64 {
        self.to_bits()
    }

    fn from_bits_u64(bits: u64) -> Self {
        f64::from_bits(bits)
    }
}
