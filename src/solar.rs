//! Sunrise & sunset from the NOAA "sunrise equation" (low precision)
//!
//! Accuracy: about a minute at mid latitudes, degrading towards the polar
//! circles. Standard refraction (-0.833°) is included; elevation is not.
//! References: Meeus, *Astronomical Algorithms* ch. 15, and the NOAA solar
//! calculator worksheets.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core::f64::consts::PI;

/// Julian date of the J2000.0 epoch (2000-01-01 12:00 UT).
const J2000: f64 = 2_451_545.0;
/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// Obliquity of the ecliptic, degrees.
const OBLIQUITY_DEG: f64 = 23.4397;
/// Apparent altitude of the Sun's upper limb at rise/set, degrees.
const HORIZON_DEG: f64 = -0.833;

/// Sunrise and sunset for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunTimes {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub solar_noon: DateTime<Utc>,
}

/// Compute sunrise/sunset for a local calendar `date` at `latitude`/`longitude`
/// (degrees, east positive).
///
/// Returns `None` during polar day or polar night, when the Sun never
/// crosses the horizon.
pub fn sun_times(date: NaiveDate, latitude: f64, longitude: f64) -> Option<SunTimes> {
    // ---------- 1. Day number since J2000 and mean solar noon ----------------
    let epoch = NaiveDate::from_ymd_opt(2000, 1, 1)?;
    let n = (date - epoch).num_days() as f64;
    let j_star = n - longitude / 360.0;

    // ---------- 2. Solar mean anomaly & equation of center -------------------
    let m_deg = (357.5291 + 0.985_600_28 * j_star).rem_euclid(360.0);
    let m = m_deg.to_radians();
    let c = 1.9148 * m.sin() + 0.0200 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin();

    // Ecliptic longitude (102.9372° = argument of perihelion)
    let lambda = (m_deg + c + 180.0 + 102.9372).rem_euclid(360.0).to_radians();

    // ---------- 3. Solar transit ----------------------------------------------
    let j_transit = J2000 + j_star + 0.0053 * m.sin() - 0.0069 * (2.0 * lambda).sin();

    // ---------- 4. Declination & hour angle -----------------------------------
    let sin_decl = lambda.sin() * OBLIQUITY_DEG.to_radians().sin();
    let cos_decl = sin_decl.asin().cos();
    let phi = latitude.to_radians();
    let cos_omega =
        (HORIZON_DEG.to_radians().sin() - phi.sin() * sin_decl) / (phi.cos() * cos_decl);
    if !(-1.0..=1.0).contains(&cos_omega) {
        return None;
    }
    let omega_days = cos_omega.acos() / (2.0 * PI);

    Some(SunTimes {
        sunrise: julian_to_utc(j_transit - omega_days)?,
        sunset: julian_to_utc(j_transit + omega_days)?,
        solar_noon: julian_to_utc(j_transit)?,
    })
}

fn julian_to_utc(jd: f64) -> Option<DateTime<Utc>> {
    let millis = ((jd - UNIX_EPOCH_JD) * 86_400_000.0).round() as i64;
    Utc.timestamp_millis_opt(millis).single()
}
