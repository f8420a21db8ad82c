//! Conversions between calendar dates and ephemeris time.
//!
//! Ephemeris time (ET) throughout the crate is TDB seconds past J2000, the
//! scale kernel coverage windows and query instants are expressed in. The
//! conversions go through [`hifitime::Epoch`].

use std::str::FromStr;

use hifitime::Epoch;

use crate::constants::Et;
use crate::ephemerist_errors::EphemeristError;

/// Parse a calendar date into ephemeris time.
///
/// Argument
/// --------
/// * `datetime`: a date in a format `hifitime` understands, e.g.
///   `2017-09-15T12:00:00 UTC` or `2017-09-15T12:00:00` (assumed UTC)
///
/// Return
/// ------
/// * the instant as TDB seconds past J2000
pub fn et_from_datetime(datetime: &str) -> Result<Et, EphemeristError> {
    let epoch = Epoch::from_str(datetime)
        .map_err(|err| EphemeristError::InvalidEpoch(format!("'{datetime}': {err}")))?;
    Ok(epoch.to_et_seconds())
}

/// Format an ephemeris time as a UTC calendar date.
///
/// Argument
/// --------
/// * `et`: TDB seconds past J2000
///
/// Return
/// ------
/// * the instant formatted as a Gregorian UTC date string
pub fn datetime_from_et(et: Et) -> String {
    Epoch::from_et_seconds(et).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn j2000_is_near_zero_et() {
        // ET differs from UTC at J2000 by the leap-second/TDB offset
        // (64.184 s minus periodic terms).
        let et = et_from_datetime("2000-01-01T12:00:00 UTC").expect("valid date");
        assert_relative_eq!(et, 64.184, epsilon = 0.01);
    }

    #[test]
    fn round_trip_through_calendar() {
        let et = 500_000_000.0;
        let formatted = datetime_from_et(et);
        let back = et_from_datetime(&formatted).expect("formatted date should parse");
        assert_relative_eq!(back, et, epsilon = 1e-3);
    }

    #[test]
    fn rejects_malformed_dates() {
        let err = et_from_datetime("not-a-date").unwrap_err();
        assert!(matches!(err, EphemeristError::InvalidEpoch(_)));
    }
}
