use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Maximum number of fractional digits accepted in an amount string.
pub const MAX_SCALE: u32 = 6;

/// Errors produced while parsing or scaling an [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
	/// The input was empty or only a sign.
	#[error("empty amount")]
	Empty,
	/// The input contained a character outside `[0-9.]` after the sign.
	#[error("invalid character {0:?} in amount")]
	InvalidChar(char),
	/// More than one decimal point.
	#[error("amount has more than one decimal point")]
	MultiplePoints,
	/// Too many fractional digits.
	#[error("amount has {0} fractional digits (max {MAX_SCALE})")]
	TooPrecise(u32),
	/// The value does not fit in 64-bit minor units.
	#[error("amount out of range")]
	Overflow,
}

/// A fixed-point decimal money amount.
///
/// Stored as an integer count of minor units together with the number of
/// fractional digits, so `"100.00"` is `10000` at scale 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Amount {
	minor: i64,
	scale: u32,
}

impl Amount {
	/// Creates an amount from minor units at the given scale.
	pub const fn from_minor(minor: i64, scale: u32) -> Self {
		Self { minor, scale }
	}

	/// Parses a decimal string such as `"100.00"`, `"-3.5"`, or `"12"`.
	pub fn parse(input: &str) -> Result<Self, AmountError> {
		let trimmed = input.trim();
		let (negative, digits) = match trimmed.strip_prefix('-') {
			Some(rest) => (true, rest),
			None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
		};
		if digits.is_empty() || digits == "." {
			return Err(AmountError::Empty);
		}

		let mut minor: i64 = 0;
		let mut scale = 0u32;
		let mut seen_point = false;
		for ch in digits.chars() {
			match ch {
				'.' if seen_point => return Err(AmountError::MultiplePoints),
				'.' => seen_point = true,
				'0'..='9' => {
					if seen_point {
						scale += 1;
						if scale > MAX_SCALE {
							return Err(AmountError::TooPrecise(scale));
						}
					}
					let digit = i64::from(ch as u8 - b'0');
					minor = minor.checked_mul(10).and_then(|m| m.checked_add(digit)).ok_or(AmountError::Overflow)?;
				}
				other => return Err(AmountError::InvalidChar(other)),
			}
		}

		Ok(Self {
			minor: if negative { -minor } else { minor },
			scale,
		})
	}

	/// Integer count of minor units.
	pub const fn minor_units(self) -> i64 {
		self.minor
	}

	/// Number of fractional digits.
	pub const fn scale(self) -> u32 {
		self.scale
	}

	/// Multiplies by an item quantity.
	pub fn times(self, quantity: u32) -> Result<Self, AmountError> {
		let minor = self.minor.checked_mul(i64::from(quantity)).ok_or(AmountError::Overflow)?;
		Ok(Self { minor, scale: self.scale })
	}

	/// Lossy conversion for display-level share math.
	pub fn to_f64(self) -> f64 {
		self.minor as f64 / 10f64.powi(self.scale as i32)
	}
}

impl FromStr for Amount {
	type Err = AmountError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Display for Amount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.scale == 0 {
			return write!(f, "{}", self.minor);
		}
		let divisor = 10i64.pow(self.scale);
		let sign = if self.minor < 0 { "-" } else { "" };
		let abs = self.minor.unsigned_abs();
		let divisor = divisor.unsigned_abs();
		write!(f, "{sign}{}.{:0width$}", abs / divisor, abs % divisor, width = self.scale as usize)
	}
}
