//! Time windowing
//!
//! Turns a caller's `[start, end]` interval into the provider-native fetch
//! units covering it: ISO weeks for SMARD (Monday 00:00 local), calendar days
//! for BMRS and EirGrid. Also builds the true local slot index of a day, which
//! has 92, 96 or 100 quarter-hours depending on DST transitions.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;

use crate::error::{MarketDataError, Result};

/// Request granularity of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Monday 00:00 local to the following Monday 00:00 (exclusive)
    Week,
    /// Local calendar day
    Day,
}

/// One provider-native request granule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchUnit {
    /// Local midnight starting the unit
    pub start: DateTime<Tz>,
    pub granularity: Granularity,
}

impl FetchUnit {
    /// Local calendar date of the unit start
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Exclusive end of the unit (next local boundary)
    pub fn end(&self) -> Result<DateTime<Tz>> {
        let days = match self.granularity {
            Granularity::Week => 7,
            Granularity::Day => 1,
        };
        local_midnight(&self.start.timezone(), self.date() + Duration::days(days))
    }

    /// Unit start as epoch milliseconds (SMARD file key)
    pub fn epoch_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }
}

/// Local midnight of `date` in `tz`
///
/// Midnight exists in every zone served here (transitions happen at 01:00,
/// 02:00 or 03:00 local); a zone with a midnight gap is reported as an error.
pub fn local_midnight(tz: &Tz, date: NaiveDate) -> Result<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_time(chrono::NaiveTime::MIN))
        .earliest()
        .ok_or_else(|| {
            MarketDataError::InvalidTime(format!("{} 00:00 does not exist in {}", date, tz))
        })
}

/// Monday-anchored weekly fetch units covering `[start, end]`
///
/// Boundaries are generated from one week before `start`'s local date up to
/// `end`; the first boundary is dropped when the second one already lies at or
/// before `start`.
///
/// # Examples
///
/// ```
/// # use chrono::TimeZone;
/// # use chrono_tz::Europe::Berlin;
/// # use grid_market_data::windowing::weekly_fetch_units;
/// let start = Berlin.with_ymd_and_hms(2023, 9, 18, 0, 0, 0).unwrap();
/// let end = Berlin.with_ymd_and_hms(2023, 9, 24, 23, 59, 0).unwrap();
///
/// let units = weekly_fetch_units(&start, &end, &Berlin).unwrap();
/// assert_eq!(units.len(), 1);
/// assert_eq!(units[0].start, start);
/// ```
pub fn weekly_fetch_units<T: TimeZone>(
    start: &DateTime<T>,
    end: &DateTime<T>,
    tz: &Tz,
) -> Result<Vec<FetchUnit>> {
    let start = start.with_timezone(tz);
    let end = end.with_timezone(tz);

    let first_date = (start.clone() - Duration::weeks(1)).date_naive();
    let to_monday = (7 - first_date.weekday().num_days_from_monday()) % 7;
    let mut monday = first_date + Duration::days(i64::from(to_monday));

    let mut units = Vec::new();
    loop {
        let boundary = local_midnight(tz, monday)?;
        if boundary > end {
            break;
        }
        units.push(FetchUnit {
            start: boundary,
            granularity: Granularity::Week,
        });
        monday += Duration::weeks(1);
    }

    if units.len() > 1 && units[1].start <= start {
        units.remove(0);
    }

    Ok(units)
}

/// Daily fetch units, one per local date from `start` through `end` inclusive
///
/// # Examples
///
/// ```
/// # use chrono::TimeZone;
/// # use chrono_tz::Europe::London;
/// # use grid_market_data::windowing::daily_fetch_units;
/// let start = London.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// let end = London.with_ymd_and_hms(2023, 1, 7, 23, 59, 0).unwrap();
///
/// assert_eq!(daily_fetch_units(&start, &end, &London).unwrap().len(), 7);
/// ```
pub fn daily_fetch_units<T: TimeZone>(
    start: &DateTime<T>,
    end: &DateTime<T>,
    tz: &Tz,
) -> Result<Vec<FetchUnit>> {
    let first = start.with_timezone(tz).date_naive();
    let last = end.with_timezone(tz).date_naive();

    first
        .iter_days()
        .take_while(|date| *date <= last)
        .map(|date| {
            Ok(FetchUnit {
                start: local_midnight(tz, date)?,
                granularity: Granularity::Day,
            })
        })
        .collect()
}

/// True local slot index of one calendar day
///
/// Steps `step_minutes` in absolute time from local midnight up to (excluding)
/// the next local midnight, so a spring-forward day is one hour short and a
/// fall-back day one hour long.
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use chrono_tz::Europe::Dublin;
/// # use grid_market_data::windowing::day_slots;
/// let spring = NaiveDate::from_ymd_opt(2023, 3, 26).unwrap();
/// let autumn = NaiveDate::from_ymd_opt(2023, 10, 29).unwrap();
/// let normal = NaiveDate::from_ymd_opt(2023, 9, 18).unwrap();
///
/// assert_eq!(day_slots(&Dublin, spring, 15).unwrap().len(), 92);
/// assert_eq!(day_slots(&Dublin, autumn, 15).unwrap().len(), 100);
/// assert_eq!(day_slots(&Dublin, normal, 15).unwrap().len(), 96);
/// ```
pub fn day_slots(tz: &Tz, date: NaiveDate, step_minutes: i64) -> Result<Vec<DateTime<Tz>>> {
    if step_minutes <= 0 {
        return Err(MarketDataError::InvalidTime(format!(
            "Slot length must be positive, got {} minutes",
            step_minutes
        )));
    }

    let first = local_midnight(tz, date)?;
    let next = local_midnight(tz, date + Duration::days(1))?;
    let step = Duration::minutes(step_minutes);

    let mut slots = Vec::new();
    let mut slot = first;
    while slot < next {
        slots.push(slot.clone());
        slot = slot + step;
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Weekday};
    use chrono_tz::Europe::{Berlin, Dublin, London};

    #[test]
    fn test_full_week_yields_single_unit() {
        let start = Berlin.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        let end = start + Duration::days(6) + Duration::hours(23) + Duration::minutes(59);

        let units = weekly_fetch_units(&start, &end, &Berlin).unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].start, start);
        assert_eq!(units[0].granularity, Granularity::Week);
    }

    #[test]
    fn test_week_starting_midweek_keeps_previous_monday() {
        // 2023-01-01 is a Sunday: data starts in the week of Monday 2022-12-26
        let start = Berlin.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(6) + Duration::hours(23) + Duration::minutes(59);

        let units = weekly_fetch_units(&start, &end, &Berlin).unwrap();
        let dates: Vec<NaiveDate> = units.iter().map(FetchUnit::date).collect();

        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2022, 12, 26).unwrap(),
                NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            ]
        );
        assert!(units.iter().all(|u| u.start.weekday() == Weekday::Mon));
        assert!(units.iter().all(|u| u.start.hour() == 0));
    }

    #[test]
    fn test_end_on_boundary_includes_that_week() {
        let start = Berlin.with_ymd_and_hms(2023, 9, 18, 0, 0, 0).unwrap();
        let end = Berlin.with_ymd_and_hms(2023, 9, 25, 0, 0, 0).unwrap();

        let units = weekly_fetch_units(&start, &end, &Berlin).unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[1].start, end);
    }

    #[test]
    fn test_weekly_units_convert_caller_timezone() {
        // 23:30 UTC on Sunday is already Monday in Berlin
        let start = chrono::Utc.with_ymd_and_hms(2023, 9, 17, 23, 30, 0).unwrap();
        let end = chrono::Utc.with_ymd_and_hms(2023, 9, 18, 12, 0, 0).unwrap();

        let units = weekly_fetch_units(&start, &end, &Berlin).unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].date(), NaiveDate::from_ymd_opt(2023, 9, 18).unwrap());
    }

    #[test]
    fn test_week_units_are_contiguous_across_dst() {
        let start = Berlin.with_ymd_and_hms(2023, 3, 20, 0, 0, 0).unwrap();
        let end = Berlin.with_ymd_and_hms(2023, 4, 9, 0, 0, 0).unwrap();

        let units = weekly_fetch_units(&start, &end, &Berlin).unwrap();

        assert_eq!(units.len(), 3);
        for pair in units.windows(2) {
            assert_eq!(pair[0].end().unwrap(), pair[1].start);
        }
        // The week containing the spring transition is one hour short
        assert_eq!(
            units[0].end().unwrap() - units[0].start.clone(),
            Duration::hours(7 * 24 - 1)
        );
    }

    #[test]
    fn test_epoch_millis_of_week() {
        let unit = FetchUnit {
            start: Berlin.with_ymd_and_hms(2023, 9, 18, 0, 0, 0).unwrap(),
            granularity: Granularity::Week,
        };
        assert_eq!(unit.epoch_millis(), 1_694_988_000_000);
    }

    #[test]
    fn test_daily_units_inclusive_of_end_date() {
        let start = London.with_ymd_and_hms(2023, 3, 25, 12, 0, 0).unwrap();
        let end = London.with_ymd_and_hms(2023, 3, 27, 0, 0, 0).unwrap();

        let units = daily_fetch_units(&start, &end, &London).unwrap();
        let dates: Vec<NaiveDate> = units.iter().map(FetchUnit::date).collect();

        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2023, 3, 25).unwrap(),
                NaiveDate::from_ymd_opt(2023, 3, 26).unwrap(),
                NaiveDate::from_ymd_opt(2023, 3, 27).unwrap(),
            ]
        );
    }

    #[test]
    fn test_daily_units_use_provider_timezone() {
        // 00:30 in Berlin is 23:30 of the previous day in Dublin
        let start = Berlin.with_ymd_and_hms(2023, 9, 18, 0, 30, 0).unwrap();
        let end = Berlin.with_ymd_and_hms(2023, 9, 18, 0, 45, 0).unwrap();

        let units = daily_fetch_units(&start, &end, &Dublin).unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].date(), NaiveDate::from_ymd_opt(2023, 9, 17).unwrap());
    }

    #[test]
    fn test_day_slots_half_hour_london() {
        let spring = NaiveDate::from_ymd_opt(2023, 3, 26).unwrap();
        let autumn = NaiveDate::from_ymd_opt(2023, 10, 29).unwrap();

        let short = day_slots(&London, spring, 30).unwrap();
        let long = day_slots(&London, autumn, 30).unwrap();

        assert_eq!(short.len(), 46);
        assert_eq!(long.len(), 50);
        // 01:00 local does not exist on the spring day
        assert_eq!(short[2].hour(), 2);
        // 01:00 local occurs twice on the autumn day
        assert_eq!(long[2].hour(), 1);
        assert_eq!(long[4].hour(), 1);
    }

    #[test]
    fn test_day_slots_rejects_zero_step() {
        let date = NaiveDate::from_ymd_opt(2023, 9, 18).unwrap();
        assert!(day_slots(&London, date, 0).is_err());
    }
}
