//! Fixed-width scalar primitives and the element type tag enumeration.
//!
//! The runtime is built entirely on Rust's native fixed-width numeric types;
//! this module exists only to name the closed set of scalar types the core
//! understands and to give that set a stable, serializable tag.

/// Closed set of scalar types an [`crate::element::Element`] or expression
/// node may carry.
///
/// Numeric values are stable across versions of this crate: they are the
/// wire/file format for anything that serializes element metadata (e.g. a
/// config compiler emitting a binary layout alongside these tags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    Int8 = 0,
    Int16 = 1,
    Int32 = 2,
    Int64 = 3,
    Uint8 = 4,
    Uint16 = 5,
    Uint32 = 6,
    Uint64 = 7,
    Float32 = 8,
    Float64 = 9,
    Bool = 10,
}

impl ElementType {
    /// Size in bytes of the backing memory for this type.
    pub const fn size(self) -> usize {
        match self {
            ElementType::Int8 | ElementType::Uint8 | ElementType::Bool => 1,
            ElementType::Int16 | ElementType::Uint16 => 2,
            ElementType::Int32 | ElementType::Uint32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::Uint64 | ElementType::Float64 => 8,
        }
    }
}

/// Trait implemented by every scalar type the core understands, tying a Rust
/// type to its [`ElementType`] tag.
///
/// Sealed by construction: only the eleven scalar types named in the
/// framework's data model implement it.
pub trait Scalar: Copy + PartialEq + Send + Sync + 'static + private::Sealed {
    /// The runtime tag corresponding to `Self`.
    const TAG: ElementType;

    /// Byte representation in host endianness, matching the state-vector
    /// binary layout (no padding, `sizeof(T)` bytes per element).
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;

    fn to_ne_bytes(self) -> Self::Bytes;
    fn from_ne_bytes(bytes: &Self::Bytes) -> Self;

    /// Widens `self` to `f64`, the common domain expression nodes evaluate
    /// in. Exact for every supported type except `u64`/`i64` magnitudes
    /// beyond 2^53, which is the same precision loss the original framework
    /// accepts (see [`Scalar::saturating_from_f64`]'s boundary comparisons).
    fn to_f64(self) -> f64;

    /// Inverse of [`Scalar::to_f64`], saturating out-of-range values to
    /// `Self::MIN`/`MAX` and mapping NaN to a zero value (`false` for `bool`).
    fn saturating_from_f64(v: f64) -> Self;
}

mod private {
    pub trait Sealed {}
}

/// Integer scalar impl, with the `f64` boundary comparator parameterized:
/// `i64`/`u64` use `<=`/`>=` instead of the usual `<`/`>` because the
/// implicit `f64`-to-integer conversion of `Self::MAX` can lose enough
/// precision that the cast result compares equal to the true max, even
/// though the max itself is not exactly representable in `f64`.
macro_rules! impl_scalar_int {
    ($t:ty, $tag:expr, lt: $lt:tt, gt: $gt:tt) => {
        impl private::Sealed for $t {}
        impl Scalar for $t {
            const TAG: ElementType = $tag;
            type Bytes = [u8; core::mem::size_of::<$t>()];

            fn to_ne_bytes(self) -> Self::Bytes {
                <$t>::to_ne_bytes(self)
            }

            fn from_ne_bytes(bytes: &Self::Bytes) -> Self {
                <$t>::from_ne_bytes(*bytes)
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn saturating_from_f64(v: f64) -> Self {
                if v != v {
                    return 0;
                }
                if v $lt (<$t>::MIN as f64) {
                    return <$t>::MIN;
                }
                if v $gt (<$t>::MAX as f64) {
                    return <$t>::MAX;
                }
                v as $t
            }
        }
    };
}

impl_scalar_int!(i8, ElementType::Int8, lt: <, gt: >);
impl_scalar_int!(i16, ElementType::Int16, lt: <, gt: >);
impl_scalar_int!(i32, ElementType::Int32, lt: <, gt: >);
impl_scalar_int!(i64, ElementType::Int64, lt: <=, gt: >=);
impl_scalar_int!(u8, ElementType::Uint8, lt: <, gt: >);
impl_scalar_int!(u16, ElementType::Uint16, lt: <, gt: >);
impl_scalar_int!(u32, ElementType::Uint32, lt: <, gt: >);
impl_scalar_int!(u64, ElementType::Uint64, lt: <, gt: >=);

impl private::Sealed for f32 {}
impl Scalar for f32 {
    const TAG: ElementType = ElementType::Float32;
    type Bytes = [u8; 4];

    fn to_ne_bytes(self) -> Self::Bytes {
        f32::to_ne_bytes(self)
    }

    fn from_ne_bytes(bytes: &Self::Bytes) -> Self {
        f32::from_ne_bytes(*bytes)
    }

    fn to_f64(self) -> f64 {
        if self != self {
            return 0.0;
        }
        self as f64
    }

    fn saturating_from_f64(v: f64) -> Self {
        if v != v {
            return 0.0;
        }
        v as f32
    }
}

impl private::Sealed for f64 {}
impl Scalar for f64 {
    const TAG: ElementType = ElementType::Float64;
    type Bytes = [u8; 8];

    fn to_ne_bytes(self) -> Self::Bytes {
        f64::to_ne_bytes(self)
    }

    fn from_ne_bytes(bytes: &Self::Bytes) -> Self {
        f64::from_ne_bytes(*bytes)
    }

    fn to_f64(self) -> f64 {
        if self != self {
            return 0.0;
        }
        self
    }

    fn saturating_from_f64(v: f64) -> Self {
        if v != v {
            return 0.0;
        }
        v
    }
}

impl private::Sealed for bool {}
impl Scalar for bool {
    const TAG: ElementType = ElementType::Bool;
    type Bytes = [u8; 1];

    fn to_ne_bytes(self) -> Self::Bytes {
        [self as u8]
    }

    fn from_ne_bytes(bytes: &Self::Bytes) -> Self {
        bytes[0] != 0
    }

    fn to_f64(self) -> f64 {
        (self as u8) as f64
    }

    fn saturating_from_f64(v: f64) -> Self {
        !(v != v || v == 0.0)
    }
}
