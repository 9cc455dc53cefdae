use std::{fmt::Display, marker::PhantomData, ops::Deref, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use self::constraint::GreaterEqualZero;

// These were deprecated as methods on Decimal, so re-implement them.
// Those implementations don't actually do zero checks, and can result
// in weird behaviour.
pub fn is_positive(d: &Decimal) -> bool {
    d.is_sign_positive() && !d.is_zero()
}

pub fn is_negative(d: &Decimal) -> bool {
    d.is_sign_negative() && !d.is_zero()
}

pub fn dollar_precision_str(d: &Decimal) -> String {
    format!("{:.2}", d)
}

fn is_amount_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, ',' | '.' | '-' | '+' | '(' | ')')
}

// "1.234.567": a 1-3 digit lead group, then groups of exactly three.
fn is_dot_grouped(s: &str) -> bool {
    let mut groups = s.split('.');
    let lead_ok = groups
        .next()
        .map_or(false, |g| (1..=3).contains(&g.len()) && g.chars().all(|c| c.is_ascii_digit()));
    lead_ok && groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

/// Parses an amount cell in any of the regional notations seen in broker
/// exports.
///
/// - Anything other than digits, separators, signs and parentheses is
///   dropped first (currency symbols, spaces, apostrophes).
/// - "(1000.50)" is negative, as is a leading or trailing '-'.
/// - With both ',' and '.' present, whichever comes last is the decimal
///   separator.
/// - A lone ',' is a decimal separator only when followed by exactly
///   two digits ("1000,50"). Otherwise commas group thousands.
/// - Several '.' without any ',' group thousands ("1.234.567"), but only
///   when every group after the first has three digits.
///
/// Returns None if nothing numeric remains, or the separators are
/// ambiguous.
pub fn try_parse_amount(raw: &str) -> Option<Decimal> {
    let mut s: String = raw.trim().chars().filter(|c| is_amount_char(*c)).collect();
    if s.is_empty() {
        return None;
    }

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') {
        negative = true;
    }
    s.retain(|c| c != '(' && c != ')');

    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.to_string();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.to_string();
    } else if let Some(rest) = s.strip_suffix('-') {
        negative = true;
        s = rest.to_string();
    }

    if s.is_empty() || s.contains(|c| c == '-' || c == '+') {
        return None;
    }

    let normalized = match (s.rfind(','), s.rfind('.')) {
        (Some(comma_i), Some(dot_i)) => {
            if comma_i > dot_i {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (Some(_), None) => {
            let parts: Vec<&str> = s.split(',').collect();
            if parts.len() == 2 && parts[1].len() == 2 {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (None, Some(_)) => {
            if s.matches('.').count() > 1 {
                if !is_dot_grouped(&s) {
                    return None;
                }
                s.replace('.', "")
            } else {
                s
            }
        }
        (None, None) => s,
    };

    let d = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -d } else { d })
}

/// Like try_parse_amount, but unparseable input yields zero.
pub fn parse_amount(raw: &str) -> Decimal {
    try_parse_amount(raw).unwrap_or(Decimal::ZERO)
}

pub trait DecConstraint {
    fn is_ok(d: &Decimal) -> bool;
}

pub mod constraint {
    use rust_decimal::Decimal;

    use super::DecConstraint;

    #[derive(PartialEq, Eq, Clone, Copy, Debug)]
    pub struct GreaterEqualZero(());
    impl DecConstraint for GreaterEqualZero {
        fn is_ok(d: &Decimal) -> bool {
            d.is_sign_positive() || d.is_zero()
        }
    }
}

// A constrained instance of Decimal. This can only be created through ::try_from,
// which will enforce the DecConstraint. This allows for a convenient and type-safe
// way to enforce what values any given value can contain.
//
// PhantomData here is size zero, and is simply to make the compiler happy.
// Otherwise, it will complain that the generic parameter is unused (even though
// we are using it in the impl).
pub struct ConstrainedDecimal<CONSTRAINT>(Decimal, PhantomData<CONSTRAINT>);

impl<CONSTRAINT: DecConstraint> TryFrom<Decimal> for ConstrainedDecimal<CONSTRAINT> {
    type Error = String;

    fn try_from(d: Decimal) -> Result<Self, Self::Error> {
        if CONSTRAINT::is_ok(&d) {
            Ok(Self(d, PhantomData))
        } else {
            Err(format!(
                "{} does not match constraints of {}",
                d,
                std::any::type_name::<CONSTRAINT>()
            ))
        }
    }
}

impl<CONSTRAINT: DecConstraint> Deref for ConstrainedDecimal<CONSTRAINT> {
    type Target = Decimal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<CONSTRAINT: DecConstraint> Display for ConstrainedDecimal<CONSTRAINT> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<CONSTRAINT: DecConstraint> std::fmt::Debug for ConstrainedDecimal<CONSTRAINT> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.0, f)
    }
}

impl<CONSTRAINT: DecConstraint> PartialEq for ConstrainedDecimal<CONSTRAINT> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<CONSTRAINT: DecConstraint> Eq for ConstrainedDecimal<CONSTRAINT> {}

impl<CONSTRAINT: DecConstraint> Clone for ConstrainedDecimal<CONSTRAINT> {
    fn clone(&self) -> Self {
        Self(self.0.clone(), self.1.clone())
    }
}

impl<CONSTRAINT: DecConstraint> Copy for ConstrainedDecimal<CONSTRAINT> {}

// Serialized exactly as the underlying Decimal.
impl<CONSTRAINT: DecConstraint> Serialize for ConstrainedDecimal<CONSTRAINT> {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.0, s)
    }
}

impl<'de, CONSTRAINT: DecConstraint> Deserialize<'de>
    for ConstrainedDecimal<CONSTRAINT>
{
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let dec = <Decimal as Deserialize>::deserialize(d)?;
        Self::try_from(dec).map_err(serde::de::Error::custom)
    }
}

impl std::ops::Add for ConstrainedDecimal<GreaterEqualZero> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        // GEZ + GEZ stays >= 0
        Self(self.0 + rhs.0, PhantomData)
    }
}

impl std::ops::AddAssign for ConstrainedDecimal<GreaterEqualZero> {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.clone() + rhs;
    }
}

impl std::iter::Sum for ConstrainedDecimal<GreaterEqualZero> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, d| acc + d)
    }
}

impl ConstrainedDecimal<GreaterEqualZero> {
    pub fn zero() -> Self {
        Self(Decimal::ZERO, PhantomData)
    }

    /// Takes the magnitude of any decimal. Used where the sign of the
    /// source cell carries no meaning (fees, withholding tax, commissions).
    pub fn from_abs(d: Decimal) -> Self {
        Self(d.abs(), PhantomData)
    }
}

// Convenience aliases
pub type GreaterEqualZeroDecimal = ConstrainedDecimal<constraint::GreaterEqualZero>;

#[macro_export]
macro_rules! gezdec {
    ($arg:literal) => {{
        use rust_decimal_macros::dec;
        $crate::util::decimal::GreaterEqualZeroDecimal::try_from(dec!($arg)).unwrap()
    }};
}
