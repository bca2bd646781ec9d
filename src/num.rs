use alloy::primitives::U256;
use fastnum::{
    UD256, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Number of decimal places sale prices are displayed with.
pub const DISPLAY_DECIMALS: i16 = 2;

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    /// Exact decimal value of the given amount of minor units.
    pub fn from_unsigned<const N: usize>(&self, value: U256) -> UnsignedDecimal<N> {
        self.with_context(
            value,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    /// Decimal value of the given amount of minor units rounded half-up
    /// to [`DISPLAY_DECIMALS`] places.
    pub fn to_display(&self, value: U256) -> UD256 {
        self.with_context::<4>(
            value,
            Context::default().with_rounding_mode(RoundingMode::HalfUp),
        )
        .rescale(DISPLAY_DECIMALS)
    }

    pub fn to_unsigned<const N: usize>(&self, value: UnsignedDecimal<N>) -> U256 {
        let rescaled = value.rescale(self.decimals as i16);
        U256::from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
    }

    fn with_context<const N: usize>(&self, value: U256, ctx: Context) -> UnsignedDecimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<N>");
        UnsignedDecimal::<N>::from_parts(unscaled, -self.decimals, ctx)
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec256;

    use super::*;

    #[test]
    fn test_numeric_converter_from_unsigned() {
        assert_eq!(
            Converter::new(0).from_unsigned::<4>(U256::from(1234567890)),
            udec256!(1234567890)
        );
        assert_eq!(
            Converter::new(6).from_unsigned::<4>(U256::from(1234567890)),
            udec256!(1234.56789)
        );
        assert_eq!(
            Converter::new(18).from_unsigned::<4>(U256::from(2500000000000000000u64)),
            udec256!(2.5)
        );
    }

    #[test]
    fn test_numeric_converter_large_amounts() {
        let raw = U256::from(10).pow(U256::from(30));
        assert_eq!(
            Converter::new(18).from_unsigned::<4>(raw),
            udec256!(1000000000000)
        );
    }

    #[test]
    fn test_numeric_converter_to_display() {
        assert_eq!(
            Converter::new(18).to_display(U256::from(2500000000000000000u64)),
            udec256!(2.50)
        );
        assert_eq!(
            Converter::new(18).to_display(U256::from(1049999999999999999u64)),
            udec256!(1.05)
        );
        assert_eq!(
            Converter::new(6).to_display(U256::from(1234)),
            udec256!(0.00)
        );
        assert_eq!(
            Converter::new(6).to_display(U256::from(5_005_000)),
            udec256!(5.01)
        );
    }

    #[test]
    fn test_numeric_converter_to_unsigned() {
        assert_eq!(
            Converter::new(0).to_unsigned(udec256!(1234567890)),
            U256::from(1234567890)
        );
        assert_eq!(
            Converter::new(6).to_unsigned(udec256!(1234.56789)),
            U256::from(1234567890)
        );
        assert_eq!(
            Converter::new(18).to_unsigned(udec256!(0.01)),
            U256::from(10000000000000000u64)
        );
    }
}
