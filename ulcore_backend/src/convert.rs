//! Conversion between raw converter counts and engineering units.
//!
//! For an `n`-bit converter working over a range `[min, max]` one count is worth
//! `(max - min) / 2^n`, so count `0` maps to `min` and the full-scale count `2^n - 1` maps to one
//! LSB below `max`:
//!
//! ```
//! use ulcore_backend::convert::*;
//! use ulcore_backend::range::UlRange;
//!
//! assert_eq!(counts_to_eng(UlRange::BIP10VOLTS, 16, 32768).unwrap(), 0.0);
//! assert_eq!(eng_to_counts(UlRange::BIP10VOLTS, 16, -10.0).unwrap(), 0);
//! assert_eq!(eng_to_counts(UlRange::BIP10VOLTS, 16, 25.0).unwrap(), 65535);
//! ```

use crate::error::{ErrorCode, UlError, UlResult};
use crate::range::UlRange;

/// Largest converter resolution, in bits, the driver can express through the 32-bit API.
pub const MAX_RESOLUTION: u32 = 32;

fn check_resolution(resolution: u32) -> UlResult<()> {
    if resolution == 0 || resolution > MAX_RESOLUTION {
        return Err(UlError::with_context(
            ErrorCode::BADBOARDTYPE,
            format!("{}-bit resolution", resolution),
        ));
    }
    Ok(())
}

fn check_range(range: UlRange) -> UlResult<()> {
    if range.span() <= 0.0 {
        return Err(UlError::with_context(ErrorCode::BADRANGE, format!("{} has no span", range)));
    }
    Ok(())
}

/// Full-scale count of an `resolution`-bit converter (`2^resolution - 1`).
pub fn max_count(resolution: u32) -> UlResult<u32> {
    check_resolution(resolution)?;
    Ok(((1u64 << resolution) - 1) as u32)
}

/// Converts a raw count into an engineering value.
///
/// Counts above the full-scale count are `BADCOUNT`; with 16-bit samples this can only
/// happen on converters narrower than 16 bits.
pub fn counts_to_eng(range: UlRange, resolution: u32, count: u32) -> UlResult<f64> {
    let full_scale = max_count(resolution)?;
    check_range(range)?;
    if count > full_scale {
        return Err(UlError::with_context(
            ErrorCode::BADCOUNT,
            format!("count {} exceeds {}", count, full_scale),
        ));
    }
    let levels = (1u64 << resolution) as f64;
    Ok(range.min() + count as f64 * range.span() / levels)
}

/// Converts an engineering value into the nearest raw count, clamped to the converter span.
pub fn eng_to_counts(range: UlRange, resolution: u32, value: f64) -> UlResult<u32> {
    let full_scale = max_count(resolution)?;
    check_range(range)?;
    if value.is_nan() {
        return Err(UlError::with_context(ErrorCode::BADDAVAL, "NaN"));
    }
    let levels = (1u64 << resolution) as f64;
    let count = ((value - range.min()) * levels / range.span()).round();
    Ok(count.max(0.0).min(full_scale as f64) as u32)
}

/// Count an ideal converter reports for `value`: the value is clamped to the range first.
pub fn quantise(range: UlRange, resolution: u32, value: f64) -> UlResult<u32> {
    eng_to_counts(range, resolution, range.clamp(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_count() {
        assert_eq!(max_count(12).unwrap(), 4095);
        assert_eq!(max_count(16).unwrap(), 65535);
        assert_eq!(max_count(32).unwrap(), u32::MAX);
        assert!(max_count(0).unwrap_err().is(ErrorCode::BADBOARDTYPE));
        assert!(max_count(33).unwrap_err().is(ErrorCode::BADBOARDTYPE));
    }

    #[test]
    fn test_bipolar_16_bit() {
        let r = UlRange::BIP10VOLTS;
        assert_eq!(counts_to_eng(r, 16, 0).unwrap(), -10.0);
        assert_eq!(counts_to_eng(r, 16, 32768).unwrap(), 0.0);
        let top = counts_to_eng(r, 16, 65535).unwrap();
        assert!((top - 9.999695).abs() < 1e-5);
    }

    #[test]
    fn test_unipolar_12_bit() {
        let r = UlRange::UNI5VOLTS;
        assert_eq!(counts_to_eng(r, 12, 2048).unwrap(), 2.5);
        assert_eq!(eng_to_counts(r, 12, 2.5).unwrap(), 2048);
        assert!(counts_to_eng(r, 12, 4096).unwrap_err().is(ErrorCode::BADCOUNT));
    }

    #[test]
    fn test_inverse_clamps() {
        let r = UlRange::BIP5VOLTS;
        assert_eq!(eng_to_counts(r, 16, -7.0).unwrap(), 0);
        assert_eq!(eng_to_counts(r, 16, 5.0).unwrap(), 65535);
        assert_eq!(eng_to_counts(r, 24, 0.0).unwrap(), 1 << 23);
    }

    #[test]
    fn test_quantise_clamps_to_range() {
        let r = UlRange::UNI5VOLTS;
        assert_eq!(quantise(r, 12, 7.5).unwrap(), 4095);
        assert_eq!(quantise(r, 12, -1.0).unwrap(), 0);
        assert_eq!(quantise(r, 12, 2.5).unwrap(), 2048);
    }

    #[test]
    fn test_round_trip_within_one_lsb() {
        let r = UlRange::BIP2PT5VOLTS;
        let lsb = r.span() / 65536.0;
        for v in [-2.4, -1.0, 0.0, 0.3333, 1.7, 2.49] {
            let c = eng_to_counts(r, 16, v).unwrap();
            let back = counts_to_eng(r, 16, c).unwrap();
            assert!((back - v).abs() <= lsb, "{} -> {} -> {}", v, c, back);
        }
    }

    #[test]
    fn test_zero_span_range() {
        assert!(counts_to_eng(UlRange::UNKNOWN, 16, 0).unwrap_err().is(ErrorCode::BADRANGE));
        assert!(eng_to_counts(UlRange::NOTUSED, 16, 0.0).unwrap_err().is(ErrorCode::BADRANGE));
    }
}
