//! Integer widths accepted by [`Element::number`](crate::Element::number).
//!
//! Each width fixes its own decode buffer: the longest numeral it can hold,
//! plus a sign slot, plus one slot for the terminating byte. A numeral that
//! runs past the buffer is rejected as overflow by digit count alone, before
//! any value is computed.

use lexical_core::FromLexical;

/// Primitive integers decodable from a JSON numeral.
pub trait Integer: FromLexical + Copy {
    /// Decimal digits in `Self::MAX`.
    const MAX_DIGITS: usize;

    /// Whether negative numerals are in range.
    const SIGNED: bool;

    /// Stack buffer of `MAX_DIGITS + 2` bytes.
    type Buffer: AsMut<[u8]>;

    fn buffer() -> Self::Buffer;
}

macro_rules! integer {
    ($($ty:ty => $signed:expr),* $(,)?) => {$(
        impl Integer for $ty {
            const MAX_DIGITS: usize = <$ty>::MAX.ilog10() as usize + 1;
            const SIGNED: bool = $signed;
            type Buffer = [u8; <$ty>::MAX.ilog10() as usize + 3];

            #[inline]
            fn buffer() -> Self::Buffer {
                [0; <$ty>::MAX.ilog10() as usize + 3]
            }
        }
    )*};
}

integer! {
    u8 => false, u16 => false, u32 => false, u64 => false, u128 => false, usize => false,
    i8 => true, i16 => true, i32 => true, i64 => true, i128 => true, isize => true,
}
