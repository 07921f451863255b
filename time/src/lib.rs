use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use thiserror::Error;

pub const JD_J2000: f64 = 2451545.0;
pub const SEC_PER_DAY: f64 = 86400.0;
pub const DAYS_PER_CENTURY: f64 = 36525.0;

//https://naif.jpl.nasa.gov/pub/naif/generic_kernels/lsk/latest_leapseconds.tls
// (TAI - UTC, UTC seconds since j2000 at which it takes effect)
pub const LEAPSECONDS: [(f64, f64); 28] = [
    (10.0, -883656000.0), // @1972-JAN-1
    (11.0, -867931200.0), // @1972-JUL-1
    (12.0, -852033600.0), // @1973-JAN-1
    (13.0, -820497600.0), // @1974-JAN-1
    (14.0, -788961600.0), // @1975-JAN-1
    (15.0, -757425600.0), // @1976-JAN-1
    (16.0, -725803200.0), // @1977-JAN-1
    (17.0, -694267200.0), // @1978-JAN-1
    (18.0, -662731200.0), // @1979-JAN-1
    (19.0, -631195200.0), // @1980-JAN-1
    (20.0, -583934400.0), // @1981-JUL-1
    (21.0, -552398400.0), // @1982-JUL-1
    (22.0, -520862400.0), // @1983-JUL-1
    (23.0, -457704000.0), // @1985-JUL-1
    (24.0, -378734400.0), // @1988-JAN-1
    (25.0, -315576000.0), // @1990-JAN-1
    (26.0, -284040000.0), // @1991-JAN-1
    (27.0, -236779200.0), // @1992-JUL-1
    (28.0, -205243200.0), // @1993-JUL-1
    (29.0, -173707200.0), // @1994-JUL-1
    (30.0, -126273600.0), // @1996-JAN-1
    (31.0, -79012800.0),  // @1997-JUL-1
    (32.0, -31579200.0),  // @1999-JAN-1
    (33.0, 189345600.0),  // @2006-JAN-1
    (34.0, 284040000.0),  // @2009-JAN-1
    (35.0, 394372800.0),  // @2012-JUL-1
    (36.0, 488980800.0),  // @2015-JUL-1
    (37.0, 536500800.0),  // @2017-JAN-1
];

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum TimeErrors {
    #[error("invalid calendar date or time of day")]
    InvalidCalendar,
    #[error("time is outside the range representable as a calendar date")]
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TimeSystem {
    GPS,
    TAI,
    UTC,
    TT,
}

/// An instant stored as seconds since the J2000 epoch (2000-01-01 12:00:00)
/// in a particular time system.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Time {
    system: TimeSystem,
    seconds_j2k: f64,
}

impl Time {
    pub fn now() -> Self {
        Time::from_utc(Utc::now())
    }

    pub fn from_jd(jd: f64, system: TimeSystem) -> Self {
        Self {
            system,
            seconds_j2k: (jd - JD_J2000) * SEC_PER_DAY,
        }
    }

    pub fn from_sec_j2k(seconds_j2k: f64, system: TimeSystem) -> Self {
        Self {
            system,
            seconds_j2k,
        }
    }

    pub fn from_datetime(dt: NaiveDateTime, system: TimeSystem) -> Self {
        let delta = dt.signed_duration_since(j2000_epoch());
        let seconds_j2k = delta.num_seconds() as f64 + delta.subsec_nanos() as f64 * 1e-9;
        Self {
            system,
            seconds_j2k,
        }
    }

    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Time::from_datetime(dt.naive_utc(), TimeSystem::UTC)
    }

    pub fn from_ymdhms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
        system: TimeSystem,
    ) -> Result<Self, TimeErrors> {
        if !(0.0..60.0).contains(&second) {
            return Err(TimeErrors::InvalidCalendar);
        }
        let sec = second.floor();
        let nano = ((second - sec) * 1e9).round().min(999_999_999.0);
        let dt = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(TimeErrors::InvalidCalendar)?
            .and_hms_nano_opt(hour, minute, sec as u32, nano as u32)
            .ok_or(TimeErrors::InvalidCalendar)?;
        Ok(Time::from_datetime(dt, system))
    }

    pub fn system(&self) -> TimeSystem {
        self.system
    }

    pub fn to_system(&self, target: TimeSystem) -> Time {
        if self.system == target {
            return *self;
        }

        // route everything through TAI, leap seconds only matter on the UTC side
        let tai = match self.system {
            TimeSystem::UTC => self.seconds_j2k + leap_seconds_utc(self.seconds_j2k),
            TimeSystem::GPS => self.seconds_j2k + 19.0,
            TimeSystem::TT => self.seconds_j2k - 32.184,
            TimeSystem::TAI => self.seconds_j2k,
        };

        let seconds_j2k = match target {
            TimeSystem::UTC => tai - leap_seconds_tai(tai),
            TimeSystem::GPS => tai - 19.0,
            TimeSystem::TT => tai + 32.184,
            TimeSystem::TAI => tai,
        };

        Time {
            system: target,
            seconds_j2k,
        }
    }

    pub fn get_jd(&self) -> f64 {
        self.seconds_j2k / SEC_PER_DAY + JD_J2000
    }

    /// Julian centuries since J2000 in this time system.
    pub fn get_jd_centuries(&self) -> f64 {
        self.seconds_j2k / SEC_PER_DAY / DAYS_PER_CENTURY
    }

    pub fn get_seconds_j2k(&self) -> f64 {
        self.seconds_j2k
    }

    pub fn get_datetime(&self) -> Result<NaiveDateTime, TimeErrors> {
        let whole = self.seconds_j2k.floor();
        let nanos = ((self.seconds_j2k - whole) * 1e9).round() as i64;
        let delta = TimeDelta::try_seconds(whole as i64)
            .ok_or(TimeErrors::OutOfRange)?
            + TimeDelta::nanoseconds(nanos);
        j2000_epoch()
            .checked_add_signed(delta)
            .ok_or(TimeErrors::OutOfRange)
    }
}

fn j2000_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

fn leap_seconds_utc(utc_j2k: f64) -> f64 {
    LEAPSECONDS
        .iter()
        .rev()
        .find(|(_, epoch)| utc_j2k >= *epoch)
        .map(|(leap, _)| *leap)
        .unwrap_or(10.0)
}

fn leap_seconds_tai(tai_j2k: f64) -> f64 {
    // the table is keyed on utc, so test each candidate offset against its own epoch
    LEAPSECONDS
        .iter()
        .rev()
        .find(|(leap, epoch)| tai_j2k - leap >= *epoch)
        .map(|(leap, _)| *leap)
        .unwrap_or(10.0)
}

impl Add<f64> for Time {
    type Output = Self;
    fn add(self, rhs: f64) -> Self::Output {
        Time::from_sec_j2k(self.seconds_j2k + rhs, self.system)
    }
}

impl Sub<Time> for Time {
    type Output = f64;
    /// Elapsed seconds between two instants, compared in TAI.
    fn sub(self, rhs: Time) -> f64 {
        self.to_system(TimeSystem::TAI).seconds_j2k - rhs.to_system(TimeSystem::TAI).seconds_j2k
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(dt: DateTime<Utc>) -> Self {
        Time::from_utc(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    #[test]
    fn test_jd_at_j2000() {
        let t = Time::from_ymdhms(2000, 1, 1, 12, 0, 0.0, TimeSystem::UTC).unwrap();
        assert_abs_diff_eq!(t.get_jd(), 2451545.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.get_jd_centuries(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_jd_from_datetime_utc() {
        let t = Time::from_ymdhms(2024, 1, 31, 6, 16, 30.5, TimeSystem::UTC).unwrap();
        assert_abs_diff_eq!(t.get_jd(), 2.4603407614641204e6, epsilon = 1e-9); //julia Dates
    }

    #[test]
    fn test_from_utc_matches_ymdhms() {
        let dt = Utc.with_ymd_and_hms(2021, 3, 20, 9, 37, 0).unwrap();
        let a = Time::from(dt);
        let b = Time::from_ymdhms(2021, 3, 20, 9, 37, 0.0, TimeSystem::UTC).unwrap();
        assert_abs_diff_eq!(a.get_seconds_j2k(), b.get_seconds_j2k(), epsilon = 1e-6);
        assert_eq!(a.system(), TimeSystem::UTC);
    }

    #[test]
    fn test_invalid_calendar() {
        assert_eq!(
            Time::from_ymdhms(2023, 2, 29, 0, 0, 0.0, TimeSystem::UTC),
            Err(TimeErrors::InvalidCalendar)
        );
        assert_eq!(
            Time::from_ymdhms(2023, 2, 28, 0, 0, 61.0, TimeSystem::UTC),
            Err(TimeErrors::InvalidCalendar)
        );
    }

    #[test]
    fn test_utc_to_tai_at_j2000() {
        let utc = Time::from_ymdhms(2000, 1, 1, 12, 0, 0.0, TimeSystem::UTC).unwrap();
        let tai = utc.to_system(TimeSystem::TAI);
        assert_abs_diff_eq!(tai.get_seconds_j2k(), 32.0, epsilon = 1e-9);
    }

    #[test]
    fn test_leap_second_round_trip() {
        let utc = Time::from_ymdhms(2017, 1, 1, 0, 0, 0.0, TimeSystem::UTC).unwrap();
        let tai = utc.to_system(TimeSystem::TAI);
        assert_abs_diff_eq!(tai - utc, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            tai.get_seconds_j2k() - utc.get_seconds_j2k(),
            37.0,
            epsilon = 1e-9
        );
        let back = tai.to_system(TimeSystem::UTC);
        assert_abs_diff_eq!(back.get_seconds_j2k(), utc.get_seconds_j2k(), epsilon = 1e-9);
    }

    #[test]
    fn test_tt_offset() {
        let utc = Time::from_ymdhms(2020, 6, 1, 0, 0, 0.0, TimeSystem::UTC).unwrap();
        let tt = utc.to_system(TimeSystem::TT);
        assert_abs_diff_eq!(
            tt.get_seconds_j2k() - utc.get_seconds_j2k(),
            37.0 + 32.184,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_datetime_before_j2000() {
        let t = Time::from_ymdhms(1999, 7, 4, 18, 30, 15.25, TimeSystem::UTC).unwrap();
        let dt = t.get_datetime().unwrap();
        let expected = NaiveDate::from_ymd_opt(1999, 7, 4)
            .unwrap()
            .and_hms_milli_opt(18, 30, 15, 250)
            .unwrap();
        assert_eq!(dt, expected);
    }

    #[test]
    fn test_add_seconds() {
        let t = Time::from_sec_j2k(100.0, TimeSystem::UTC) + 86400.0;
        assert_abs_diff_eq!(t.get_seconds_j2k(), 86500.0, epsilon = 1e-12);
    }
}
