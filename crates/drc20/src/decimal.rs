use super::*;

/// Non-negative fixed-point amount with eighteen fractional digits.
///
/// Every literal of at most [`MAX_LITERAL_LENGTH`] characters is represented
/// exactly. Arithmetic is checked and reports overflow rather than wrapping
/// or truncating.
#[derive(
  Debug,
  Default,
  Copy,
  Clone,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  DeserializeFromStr,
  SerializeDisplay,
)]
pub struct Decimal(u128);

#[derive(Debug, Error, PartialEq)]
pub enum DecimalError {
  #[error("empty amount")]
  Empty,
  #[error("invalid character `{0}` in amount")]
  Character(char),
  #[error("malformed amount `{0}`")]
  Malformed(String),
  #[error("amount has more than {} fractional digits", Decimal::SCALE)]
  Precision,
  #[error("amount overflows")]
  Overflow,
}

impl Decimal {
  pub const SCALE: u32 = 18;
  pub const ZERO: Self = Self(0);

  const ONE: u128 = 10u128.pow(Self::SCALE);

  pub fn is_zero(self) -> bool {
    self.0 == 0
  }

  pub fn checked_add(self, rhs: Self) -> Result<Self, DecimalError> {
    self
      .0
      .checked_add(rhs.0)
      .map(Self)
      .ok_or(DecimalError::Overflow)
  }

  /// Returns `None` if `rhs` is larger than `self`.
  pub fn checked_sub(self, rhs: Self) -> Option<Self> {
    self.0.checked_sub(rhs.0).map(Self)
  }
}

impl FromStr for Decimal {
  type Err = DecimalError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.is_empty() {
      return Err(DecimalError::Empty);
    }

    let (integer, fraction) = match s.split_once('.') {
      Some((integer, fraction)) => (integer, fraction),
      None => (s, ""),
    };

    if integer.is_empty() || (s.contains('.') && fraction.is_empty()) {
      return Err(DecimalError::Malformed(s.into()));
    }

    let mut value = 0u128;
    for c in integer.chars() {
      let digit = c.to_digit(10).ok_or(DecimalError::Character(c))?;
      value = value
        .checked_mul(10)
        .and_then(|value| value.checked_add(digit.into()))
        .ok_or(DecimalError::Overflow)?;
    }

    if let Some(c) = fraction.chars().find(|c| !c.is_ascii_digit()) {
      return Err(DecimalError::Character(c));
    }

    let fraction = fraction.trim_end_matches('0');

    if fraction.len() > Self::SCALE as usize {
      return Err(DecimalError::Precision);
    }

    let mut fractional = 0u128;
    for c in fraction.chars() {
      fractional = fractional * 10 + u128::from(c.to_digit(10).unwrap_or_default());
    }

    let padding = Self::SCALE - u32::try_from(fraction.len()).map_err(|_| DecimalError::Precision)?;

    value
      .checked_mul(Self::ONE)
      .and_then(|value| value.checked_add(fractional * 10u128.pow(padding)))
      .map(Self)
      .ok_or(DecimalError::Overflow)
  }
}

impl Display for Decimal {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    let integer = self.0 / Self::ONE;
    let fraction = self.0 % Self::ONE;

    if fraction == 0 {
      return write!(f, "{integer}");
    }

    let fraction = format!("{fraction:0>width$}", width = Self::SCALE as usize);

    write!(f, "{integer}.{}", fraction.trim_end_matches('0'))
  }
}
