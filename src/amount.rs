use std::fmt;

use tracing::debug;

/// Fixed-point money value with 2 decimal places, stored as a scaled integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 100;

    pub const ZERO: Amount = Amount(0);

    pub fn from_float(value: f64) -> Self {
        Amount((value * Self::SCALE as f64).round() as i64)
    }

    pub fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    /// Coerce a spreadsheet cell into an amount.
    ///
    /// Thousands separators are stripped before parsing. Empty, unparseable
    /// and non-finite cells all become zero, as do values too large to hold in
    /// hundredths. A bad cell never fails a row.
    pub fn coerce(cell: &str) -> Self {
        let cleaned: String = cell.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return Self::ZERO;
        }
        match cleaned.parse::<f64>() {
            Ok(value) if Self::in_range(value) => Self::from_float(value),
            _ => {
                debug!(cell, "unparseable amount coerced to zero");
                Self::ZERO
            }
        }
    }

    // i64::MIN as f64 is exact; i64::MAX as f64 rounds up to 2^63
    fn in_range(value: f64) -> bool {
        let scaled = (value * Self::SCALE as f64).round();
        (i64::MIN as f64..i64::MAX as f64).contains(&scaled)
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Format with `,` thousands grouping, e.g. `1,234.50`.
    pub fn grouped(self) -> String {
        let plain = self.to_string();
        let (sign, digits) = match plain.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", plain.as_str()),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, "00"));

        let mut out = String::with_capacity(whole.len() + whole.len() / 3);
        for (idx, ch) in whole.chars().enumerate() {
            if idx > 0 && (whole.len() - idx) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        format!("{sign}{out}.{frac}")
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let frac = abs % Self::SCALE as u64;
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

// Arithmetic saturates at the i64 bounds instead of wrapping or panicking.

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(self.0.saturating_neg())
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, amount| acc + amount)
    }
}
