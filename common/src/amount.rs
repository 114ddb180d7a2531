//! Amount arithmetic for SplitSettle.
//!
//! Debts and token balances are unsigned integers in the smallest unit. Every
//! addition on a stored amount goes through the checked helpers here so that
//! overflow surfaces as [`SplitSettleError::ArithmeticOverflow`] instead of
//! wrapping.

use crate::error::{Result, SplitSettleError};

/// Unsigned amount in the smallest unit.
pub type Amount = u128;

/// Add two amounts, failing on overflow.
pub fn checked_add(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_add(b).ok_or(SplitSettleError::ArithmeticOverflow)
}

/// Sum a sequence of amounts, failing on overflow.
pub fn checked_sum<'a, I>(amounts: I) -> Result<Amount>
where
    I: IntoIterator<Item = &'a Amount>,
{
    amounts
        .into_iter()
        .try_fold(0, |acc: Amount, value| checked_add(acc, *value))
}

/// Floor division of `amount` into `parts` equal shares.
///
/// Returns the per-part share and the remainder left over. `parts` must be
/// non-zero.
pub fn split_floor(amount: Amount, parts: usize) -> (Amount, Amount) {
    let parts = parts as Amount;
    (amount / parts, amount % parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(checked_add(1, 2).unwrap(), 3);
        assert!(matches!(
            checked_add(Amount::MAX, 1),
            Err(SplitSettleError::ArithmeticOverflow)
        ));
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum(&[1, 2, 3]).unwrap(), 6);
        assert_eq!(checked_sum(&Vec::<Amount>::new()).unwrap(), 0);
        assert!(checked_sum(&[Amount::MAX, 1]).is_err());
    }

    #[test]
    fn test_split_floor() {
        assert_eq!(split_floor(3, 3), (1, 0));
        assert_eq!(split_floor(10, 3), (3, 1));
        assert_eq!(split_floor(2, 5), (0, 2));
    }
}
