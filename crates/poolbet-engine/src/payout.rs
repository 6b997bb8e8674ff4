//! Payout arithmetic.
//!
//! ```text
//! winning_pool == 0 : payout = own total stake            (refund)
//! otherwise         : payout = w + floor(w * losing / winning)
//! ```
//!
//! where `w` is the bettor's stake on the declared outcome. Integer division
//! truncates; the remainder stays in escrow and is never claimable, so the
//! sum of all payouts is at most `winning_pool + losing_pool`.
//!
//! `w * losing` can exceed [`Amount`] even when the payout itself fits, so
//! the share is computed over a 256-bit intermediate ([`mul_div_floor`]).

use poolbet_types::{Amount, PoolSnapshot, PoolbetError, Result};

/// Payout for one bettor.
///
/// - `winning_stake`: the bettor's stake on `snapshot.outcome`
/// - `total_stake`: the bettor's stake on both sides
///
/// # Errors
/// Returns [`PoolbetError::Overflow`] if the share or the final sum does not
/// fit in [`Amount`].
pub fn compute_payout(
    snapshot: &PoolSnapshot,
    winning_stake: Amount,
    total_stake: Amount,
) -> Result<Amount> {
    if snapshot.is_refund() {
        return Ok(total_stake);
    }
    if winning_stake == 0 {
        return Ok(0);
    }

    let share = mul_div_floor(winning_stake, snapshot.losing_pool, snapshot.winning_pool)
        .ok_or(PoolbetError::Overflow {
            context: "payout share",
        })?;

    winning_stake
        .checked_add(share)
        .ok_or(PoolbetError::Overflow {
            context: "payout total",
        })
}

/// `floor(a * b / divisor)` with a full 256-bit product.
///
/// Returns `None` if `divisor` is zero or the quotient exceeds `u128`.
#[must_use]
pub fn mul_div_floor(a: u128, b: u128, divisor: u128) -> Option<u128> {
    if divisor == 0 {
        return None;
    }
    let (hi, lo) = widening_mul(a, b);
    if hi == 0 {
        return Some(lo / divisor);
    }
    if hi >= divisor {
        return None;
    }

    // Shift-subtract long division of (hi, lo) by divisor; rem < divisor holds
    // before every step.
    let mut rem = hi;
    let mut quot: u128 = 0;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> bit) & 1);
        quot <<= 1;
        if carry == 1 || rem >= divisor {
            rem = rem.wrapping_sub(divisor);
            quot |= 1;
        }
    }
    Some(quot)
}

/// 128x128 -> 256-bit product as `(hi, lo)`, over 64-bit limbs.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = (1 << 64) - 1;
    let (a0, a1) = (a & MASK, a >> 64);
    let (b0, b1) = (b & MASK, b >> 64);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    let middle = (p00 >> 64) + (p01 & MASK) + (p10 & MASK);
    let lo = (p00 & MASK) | (middle << 64);
    let hi = p11 + (p01 >> 64) + (p10 >> 64) + (middle >> 64);
    (hi, lo)
}

/// Upper bound on everything a resolved match can ever pay out.
pub fn payout_ceiling(snapshot: &PoolSnapshot) -> Result<Amount> {
    snapshot.total()
}
