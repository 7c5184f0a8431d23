//! Wide intermediate arithmetic for fixed-point reward math.
//!
//! Products such as `elapsed × rate × PRECISION` overflow `u128` long before
//! their quotient does, so every multiply-then-divide goes through a 256-bit
//! intermediate and only the final result is narrowed back to `u128`.

use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer used only for intermediate products.
    pub struct U256(4);
}

/// Narrow a 256-bit value back to `u128`, or `None` if it does not fit.
fn narrow(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        None
    } else {
        Some(value.low_u128())
    }
}

/// `a × b / denominator`, rounded down. `None` on a zero denominator or
/// when the quotient does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    let product = U256::from(a).checked_mul(U256::from(b))?;
    narrow(product / U256::from(denominator))
}

/// `a × b × c / denominator`, rounded down.
pub fn mul3_div(a: u128, b: u128, c: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    let product = U256::from(a)
        .checked_mul(U256::from(b))?
        .checked_mul(U256::from(c))?;
    narrow(product / U256::from(denominator))
}
