//! 256-bit integers carried as decimals.
//!
//! EVM style amounts do not fit into 64 or even 128 bits. A [`Wei`] keeps an
//! unsigned 256-bit magnitude, a sign and a decimal scale, so the full
//! `uint256` range (up to `2^256 - 1`) is representable and
//! `Wei::from_int256(2137 * 10^16, 18)` is the number `21.37`.
//!
//! Values are normalized on construction (trailing zeros of the magnitude are
//! folded into the scale, zero is never negative), so equal numbers compare
//! equal regardless of how they were produced.

use arrow::datatypes::i256;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::value::Value;
use crate::variant::VariantResolution;

/// Largest value a BIGNUMERIC column can hold.
pub const BIGNUMERIC_MAX: &str = "578960446186580977117854925043439539266";

/// Smallest value a BIGNUMERIC column can hold.
pub const BIGNUMERIC_MIN: &str = "-578960446186580977117854925043439539267";

/// Type name used when an oversized wei is rerouted to a text variant.
pub const WEI_OVERFLOW_VARIANT: &str = "str";

/// Maximum number of fractional digits a [`Wei`] can carry.
pub const MAX_WEI_SCALE: u8 = 76;

/// Unsigned 256-bit integer as big-endian 64-bit limbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Magnitude([u64; 4]);

impl Magnitude {
    const ZERO: Self = Self([0; 4]);

    fn from_u128(value: u128) -> Self {
        Self([0, 0, (value >> 64) as u64, value as u64])
    }

    fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *limb = u64::from_be_bytes(word);
        }
        Self(limbs)
    }

    fn to_be_bytes(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (chunk, limb) in bytes.chunks_exact_mut(8).zip(self.0) {
            chunk.copy_from_slice(&limb.to_be_bytes());
        }
        bytes
    }

    fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }

    /// `self * mul + add`, `None` on overflow.
    fn checked_mul_add(self, mul: u64, add: u64) -> Option<Self> {
        let mut limbs = [0u64; 4];
        let mut carry = add as u128;
        for idx in (0..4).rev() {
            let wide = self.0[idx] as u128 * mul as u128 + carry;
            limbs[idx] = wide as u64;
            carry = wide >> 64;
        }
        (carry == 0).then_some(Self(limbs))
    }

    fn div_rem(self, divisor: u64) -> (Self, u64) {
        let mut limbs = [0u64; 4];
        let mut rem = 0u128;
        for idx in 0..4 {
            let wide = (rem << 64) | self.0[idx] as u128;
            limbs[idx] = (wide / divisor as u128) as u64;
            rem = wide % divisor as u128;
        }
        (Self(limbs), rem as u64)
    }

    fn parse_decimal(digits: &str) -> Option<Self> {
        if digits.is_empty() {
            return None;
        }
        digits.bytes().try_fold(Self::ZERO, |acc, b| {
            let digit = (b as char).to_digit(10)?;
            acc.checked_mul_add(10, digit as u64)
        })
    }

    fn parse_hex(digits: &str) -> Option<Self> {
        if digits.is_empty() {
            return None;
        }
        digits.bytes().try_fold(Self::ZERO, |acc, b| {
            let digit = (b as char).to_digit(16)?;
            acc.checked_mul_add(16, digit as u64)
        })
    }

    fn to_decimal_string(self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut digits = Vec::with_capacity(78);
        let mut rest = self;
        while !rest.is_zero() {
            let (quotient, digit) = rest.div_rem(10);
            digits.push(b'0' + digit as u8);
            rest = quotient;
        }
        digits.reverse();
        String::from_utf8_lossy(&digits).into_owned()
    }
}

/// 256-bit magnitude with a sign and a decimal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Wei {
    negative: bool,
    magnitude: Magnitude,
    scale: u8,
}

impl Wei {
    /// Build from a raw signed 256-bit integer and the number of decimals it carries.
    ///
    /// Returns `None` when `decimals` exceeds [`MAX_WEI_SCALE`].
    pub fn from_int256(mantissa: i256, decimals: u8) -> Option<Self> {
        if decimals > MAX_WEI_SCALE {
            return None;
        }
        let negative = mantissa < i256::ZERO;
        // two's complement negation of i256::MIN keeps the bit pattern 2^255
        let bits = if negative { mantissa.wrapping_neg() } else { mantissa };
        Some(Self::normalized(
            negative,
            Magnitude::from_be_bytes(bits.to_be_bytes()),
            decimals,
        ))
    }

    /// Build from a 64-bit integer (scale 0).
    pub fn from_i64(value: i64) -> Self {
        Self::normalized(
            value < 0,
            Magnitude::from_u128(value.unsigned_abs() as u128),
            0,
        )
    }

    /// Parse a decimal (`"-21.37"`) or `0x` prefixed hex (`"0xff"`) string.
    ///
    /// Surrounding whitespace is ignored. Hex strings are always integral.
    /// Magnitudes up to `2^256 - 1` are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if body.is_empty() {
            return None;
        }

        if let Some(hex_digits) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
            let magnitude = Magnitude::parse_hex(hex_digits)?;
            return Some(Self::normalized(negative, magnitude, 0));
        }

        let (int_part, frac_part) = match body.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if frac_part.len() > MAX_WEI_SCALE as usize {
            return None;
        }

        let digits = format!("{}{}", int_part, frac_part);
        let magnitude = Magnitude::parse_decimal(&digits)?;
        Some(Self::normalized(negative, magnitude, frac_part.len() as u8))
    }

    /// Build from a fixed-point decimal.
    pub fn from_decimal(value: &Decimal) -> Option<Self> {
        Self::parse(&value.normalize().to_string())
    }

    /// The signed 256-bit mantissa, `None` when the magnitude needs the full
    /// unsigned range.
    pub fn mantissa(&self) -> Option<i256> {
        let bits = i256::from_be_bytes(self.magnitude.to_be_bytes());
        match (self.negative, bits < i256::ZERO) {
            (false, false) => Some(bits),
            (false, true) => None,
            (true, false) => Some(bits.wrapping_neg()),
            // only 2^255 itself has a negative counterpart
            (true, true) => (bits == i256::MIN).then_some(bits),
        }
    }

    /// Number of fractional decimal digits.
    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Returns true if the value has no fractional part.
    pub fn is_integral(&self) -> bool {
        self.scale == 0
    }

    /// Convert to an `i64` if integral and in range.
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integral() {
            return None;
        }
        let [0, 0, high, low] = self.magnitude.0 else {
            return None;
        };
        let magnitude = ((high as u128) << 64) | low as u128;
        let signed = if self.negative {
            0i128.checked_sub_unsigned(magnitude)?
        } else {
            i128::try_from(magnitude).ok()?
        };
        i64::try_from(signed).ok()
    }

    /// Convert to the closest `f64`.
    pub fn to_f64(&self) -> f64 {
        // Parsing the decimal rendering keeps the rounding correct for any size.
        self.to_string().parse::<f64>().unwrap_or(f64::NAN)
    }

    /// Convert to a fixed-point decimal if it fits into 96 bits.
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.to_string()).ok()
    }

    /// Returns true if the value fits into a BIGNUMERIC column.
    pub fn fits_bignumeric(&self) -> bool {
        let bound = if self.negative { BIGNUMERIC_MIN } else { BIGNUMERIC_MAX };
        let scaled = Magnitude::parse_decimal(bound.trim_start_matches('-')).and_then(|bound| {
            (0..self.scale).try_fold(bound, |acc, _| acc.checked_mul_add(10, 0))
        });
        // a bound that overflows 256 bits cannot be exceeded
        scaled.map_or(true, |bound| self.magnitude <= bound)
    }

    /// Variant resolution: oversized values are rerouted to a text variant.
    pub fn resolve(&self) -> VariantResolution {
        if self.fits_bignumeric() {
            VariantResolution::Identity
        } else {
            VariantResolution::Typed {
                type_name: WEI_OVERFLOW_VARIANT.to_string(),
                value: Value::Text(self.to_string()),
            }
        }
    }

    fn normalized(negative: bool, magnitude: Magnitude, scale: u8) -> Self {
        let mut magnitude = magnitude;
        let mut scale = scale;
        while scale > 0 {
            let (quotient, rem) = magnitude.div_rem(10);
            if rem != 0 {
                break;
            }
            magnitude = quotient;
            scale -= 1;
        }
        if magnitude.is_zero() {
            return Self {
                negative: false,
                magnitude,
                scale: 0,
            };
        }
        Self {
            negative,
            magnitude,
            scale,
        }
    }
}

impl std::fmt::Display for Wei {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.negative { "-" } else { "" };
        let digits = self.magnitude.to_decimal_string();
        if self.scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let split = padded.len() - scale;
        write!(f, "{}{}.{}", sign, &padded[..split], &padded[split..])
    }
}

impl FromStr for Wei {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Wei::parse(s).ok_or_else(|| format!("Invalid wei value: '{}'", s))
    }
}
