//! Sunrise/sunset source.
//!
//! Unlike the other adapters this one does no network I/O: the times come
//! from [`crate::solar`] for the configured coordinates. It still goes through
//! [`Fetch`] so the orchestrator treats every source the same way.

use crate::solar::sun_times;
use crate::sources::{Fetch, FetchError};
use crate::{Coordinates, SunEvent, SunPhase};
use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct SunAdapter {
    position: Coordinates,
    tz: Tz,
}

impl SunAdapter {
    pub fn new(position: Coordinates, tz: Tz) -> Self {
        Self { position, tz }
    }
}

#[async_trait]
impl Fetch for SunAdapter {
    type Output = SunEvent;

    async fn fetch(&self) -> Result<SunEvent, FetchError> {
        next_sun_event(Utc::now(), self.position, self.tz)
    }
}

/// Work out the next sunrise or sunset after `now`.
///
/// Before sunrise the next event is today's sunrise; between sunrise and
/// sunset it is today's sunset; after sunset it is tomorrow's sunrise, which
/// also replaces the `sunrise` field.
pub fn next_sun_event(
    now: DateTime<Utc>,
    position: Coordinates,
    tz: Tz,
) -> Result<SunEvent, FetchError> {
    let today = now.with_timezone(&tz).date_naive();
    let times = sun_times(today, position.latitude, position.longitude)
        .ok_or(FetchError::MissingData("sun does not rise or set today"))?;

    if now < times.sunrise {
        return Ok(SunEvent {
            next: SunPhase::Sunrise,
            at: times.sunrise,
            sunrise: times.sunrise,
            sunset: times.sunset,
        });
    }
    if now < times.sunset {
        return Ok(SunEvent {
            next: SunPhase::Sunset,
            at: times.sunset,
            sunrise: times.sunrise,
            sunset: times.sunset,
        });
    }

    let tomorrow = today
        .checked_add_days(Days::new(1))
        .ok_or(FetchError::MissingData("calendar overflow"))?;
    let next = sun_times(tomorrow, position.latitude, position.longitude)
        .ok_or(FetchError::MissingData("sun does not rise tomorrow"))?;
    Ok(SunEvent {
        next: SunPhase::Sunrise,
        at: next.sunrise,
        sunrise: next.sunrise,
        sunset: times.sunset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;

    const PACIFIC_BEACH: Coordinates = Coordinates {
        latitude: 32.7934,
        longitude: -117.2544,
    };

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Los_Angeles
            .with_ymd_and_hms(2024, 6, 21, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_before_sunrise_next_is_sunrise() {
        let event = next_sun_event(at(4, 0), PACIFIC_BEACH, Los_Angeles).unwrap();
        assert_eq!(event.next, SunPhase::Sunrise);
        assert_eq!(event.at, event.sunrise);
        assert!(event.sunrise < event.sunset);
    }

    #[test]
    fn test_midday_next_is_sunset() {
        let event = next_sun_event(at(12, 0), PACIFIC_BEACH, Los_Angeles).unwrap();
        assert_eq!(event.next, SunPhase::Sunset);
        assert_eq!(event.at, event.sunset);
    }

    #[test]
    fn test_after_sunset_rolls_to_tomorrow() {
        let now = at(22, 0);
        let event = next_sun_event(now, PACIFIC_BEACH, Los_Angeles).unwrap();
        assert_eq!(event.next, SunPhase::Sunrise);
        assert!(event.at > now);
        assert_eq!(
            event.at.with_timezone(&Los_Angeles).date_naive(),
            chrono::NaiveDate::from_ymd_opt(2024, 6, 22).unwrap()
        );
        // Today's sunset is kept for proximity checks
        assert!(event.sunset < now);
    }

    #[test]
    fn test_polar_night_is_a_fetch_failure() {
        let svalbard = Coordinates {
            latitude: 78.2,
            longitude: 15.6,
        };
        let winter = Utc.with_ymd_and_hms(2024, 12, 21, 12, 0, 0).unwrap();
        assert!(matches!(
            next_sun_event(winter, svalbard, chrono_tz::Europe::Oslo),
            Err(FetchError::MissingData(_))
        ));
    }
}
