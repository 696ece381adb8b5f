//! Replacement fee computation.

use super::state::NetworkFees;

/// Fees for a replacement transaction: the previous fees raised by
/// `percent`, or the current network fees if those are higher. The priority
/// fee never exceeds the max fee.
#[must_use]
pub fn bump_fees(previous: NetworkFees, current: NetworkFees, percent: u64) -> NetworkFees {
    let max_fee_per_gas = bumped(previous.max_fee_per_gas, percent).max(current.max_fee_per_gas);
    let max_priority_fee_per_gas = bumped(previous.max_priority_fee_per_gas, percent)
        .max(current.max_priority_fee_per_gas)
        .min(max_fee_per_gas);
    NetworkFees {
        max_fee_per_gas,
        max_priority_fee_per_gas,
    }
}

fn bumped(fee: u64, percent: u64) -> u64 {
    let raised = u128::from(fee) * (100 + u128::from(percent)) / 100;
    // Round up so a 1 wei fee still increases.
    let raised = if raised == u128::from(fee) { raised + 1 } else { raised };
    u64::try_from(raised).unwrap_or(u64::MAX)
}
