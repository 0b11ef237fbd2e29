//! Conversions between RLC (display unit) and nRLC (stored unit).

use crate::config::NRLC_PER_RLC;

/// Fraction digits shown when rendering RLC.
const DISPLAY_DECIMALS: u32 = 6;

/// Sanitize a user-entered RLC amount: non-finite or negative input yields `default`.
pub fn normalize_rlc_input(value: f64, default: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        default
    }
}

/// Convert an RLC amount to nRLC, rounding to the nearest unit.
pub fn rlc_to_nrlc(rlc: f64) -> u64 {
    let rlc = normalize_rlc_input(rlc, 0.0);
    let nrlc = (rlc * NRLC_PER_RLC as f64).round();
    if nrlc >= u64::MAX as f64 {
        u64::MAX
    } else {
        nrlc as u64
    }
}

/// Render an nRLC amount in RLC with at most six fraction digits.
pub fn format_rlc(nrlc: u64) -> String {
    if nrlc == 0 {
        return "0".to_string();
    }
    let step = NRLC_PER_RLC / 10u64.pow(DISPLAY_DECIMALS);
    let mut whole = nrlc / NRLC_PER_RLC;
    let remainder = nrlc % NRLC_PER_RLC;
    let mut fraction = (remainder + step / 2) / step;
    if fraction == 10u64.pow(DISPLAY_DECIMALS) {
        whole += 1;
        fraction = 0;
    }
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{fraction:0width$}", width = DISPLAY_DECIMALS as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
