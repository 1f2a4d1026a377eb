//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, and
//! the `Rate` type for IVA and discount percentages.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In many retail systems:                                                │
//! │    10.00 / 3 = 3.33 (×3 = 9.99)  → Lost 0.01!                          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1000 cents / 3 = 333 cents (×3 = 999 cents)                         │
//! │    We KNOW we lost 1 cent, and handle it explicitly                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tpv_core::money::{Money, Rate};
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // 10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;                      // 21.98
//! let total = price + Money::from_cents(500);   // 15.99
//!
//! // IVA at 21%
//! let iva = price.apply_rate(Rate::from_bps(2100));
//! assert_eq!(iva.cents(), 231);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate (IVA or discount) represented in basis points.
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2100 bps = 21.00% (e.g., Spanish general IVA)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds, corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Why Cents?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// Storage, calculations, and the API all use cents. Only the UI
    /// converts to major units for display.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a percentage rate and returns the resulting portion.
    ///
    /// Used for both IVA amounts and discount amounts.
    ///
    /// ## Implementation
    /// Integer math in i128: `(amount * bps + 5000) / 10000`
    /// The +5000 provides rounding (5000/10000 = 0.5)
    ///
    /// ## Example
    /// ```rust
    /// use tpv_core::money::{Money, Rate};
    ///
    /// let base = Money::from_cents(10000); // 100.00
    /// let iva = base.apply_rate(Rate::from_bps(2100)); // 21%
    /// assert_eq!(iva.cents(), 2100); // 21.00
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        // i128 to prevent overflow on large amounts
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tpv_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // 2.99
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897); // 8.97
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Proportional Share Allocation
// =============================================================================

/// Allocates a proportional share of `pot` to `part` of `whole`.
///
/// This is how a cart-level discount is spread over its lines: each
/// line receives `line.subtotal / cart.subtotal` of the discounted
/// subtotal, and its IVA is computed on that share.
///
/// ## Division by Zero
/// When `whole` is zero the share is defined as zero. A cart whose
/// subtotal is zero (all free items) has nothing to distribute.
///
/// ## Example
/// ```rust
/// use tpv_core::money::{allocate_share, Money};
///
/// // Line of 100.00 in a 150.00 cart, distributing 135.00
/// let share = allocate_share(
///     Money::from_cents(10000),
///     Money::from_cents(15000),
///     Money::from_cents(13500),
/// );
/// assert_eq!(share.cents(), 9000); // 90.00
/// ```
pub fn allocate_share(part: Money, whole: Money, pot: Money) -> Money {
    if whole.is_zero() {
        return Money::zero();
    }

    // Round-half-up in i128, same scheme as apply_rate
    let num = part.cents() as i128 * pot.cents() as i128;
    let den = whole.cents() as i128;
    let half = den / 2;
    Money::from_cents(((num + half) / den) as i64)
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Use frontend formatting for actual
/// UI display to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_rate_from_bps() {
        let rate = Rate::from_bps(2100);
        assert_eq!(rate.bps(), 2100);
        assert!((rate.percentage() - 21.0).abs() < 0.001);
    }

    #[test]
    fn test_rate_from_percentage() {
        let rate = Rate::from_percentage(10.0);
        assert_eq!(rate.bps(), 1000);
    }

    #[test]
    fn test_apply_rate_exact() {
        // 100.00 at 21% = 21.00
        let base = Money::from_cents(10000);
        assert_eq!(base.apply_rate(Rate::from_bps(2100)).cents(), 2100);
    }

    #[test]
    fn test_apply_rate_rounds() {
        // 10.50 at 21% = 2.205 → 2.21
        let base = Money::from_cents(1050);
        assert_eq!(base.apply_rate(Rate::from_bps(2100)).cents(), 221);
    }

    #[test]
    fn test_apply_zero_rate() {
        let base = Money::from_cents(10000);
        assert_eq!(base.apply_rate(Rate::zero()).cents(), 0);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(299);
        assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    }

    #[test]
    fn test_allocate_share_exact() {
        // 100 of 150, distributing 135 → 90
        let share = allocate_share(
            Money::from_cents(10000),
            Money::from_cents(15000),
            Money::from_cents(13500),
        );
        assert_eq!(share.cents(), 9000);
    }

    #[test]
    fn test_allocate_share_zero_whole() {
        let share = allocate_share(Money::zero(), Money::zero(), Money::from_cents(1000));
        assert!(share.is_zero());
    }

    #[test]
    fn test_allocate_share_rounding() {
        // 1 of 3, distributing 100 cents → 33 (rounded down from 33.33)
        let share = allocate_share(
            Money::from_cents(1),
            Money::from_cents(3),
            Money::from_cents(100),
        );
        assert_eq!(share.cents(), 33);
    }
}
