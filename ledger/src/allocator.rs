//! Share planning for forced uniform unbonding.
//!
//! Given a delegator's per-delegation amounts sorted ascending, computes
//! how much to withdraw from each so the total spreads as evenly as
//! possible, draining the smallest delegations first.

/// Per-delegation withdrawal amounts for taking `total` out of
/// `amounts`, which must be sorted ascending.
///
/// Each delegation's base share is `total / amounts.len()` (integer
/// division). Walking smallest-first, a delegation smaller than the
/// current share is drained fully and its shortfall is spread over the
/// delegations still to come; anything else gives up exactly the current
/// share. The truncation remainder lands on the last (largest)
/// delegation.
///
/// The returned amounts always sum to `total`; when `total` exceeds what
/// the delegations hold, the plan overdraws the largest delegation and
/// the corresponding unbond fails downstream.
pub fn uniform_shares(amounts: &[u128], total: u128) -> Vec<u128> {
    if amounts.is_empty() {
        return Vec::new();
    }

    let mut shares = Vec::with_capacity(amounts.len());
    let mut remaining = amounts.len() as u128;
    let mut share = total / remaining;
    let mut withdrawn: u128 = 0;

    for &amount in amounts {
        remaining -= 1;
        if amount < share {
            shares.push(amount);
            withdrawn += amount;
            if remaining > 0 {
                share += (share - amount) / remaining;
            }
        } else {
            shares.push(share);
            withdrawn += share;
        }
    }

    let leftover = total.saturating_sub(withdrawn);
    if leftover > 0 {
        if let Some(largest) = shares.last_mut() {
            *largest += leftover;
        }
    }

    shares
}
