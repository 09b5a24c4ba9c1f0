//! Trigger expressions.
//!
//! Cron expressions use six fields evaluated in the host's local time zone:
//!
//! `second minute hour day_of_month month day_of_week`
//!
//! Examples:
//! - `"0 0 3 * * *"` - every day at 03:00
//! - `"0 */30 * * * *"` - every 30 minutes
//! - `"0 0 9 * * Mon-Fri"` - 09:00 on weekdays
//!
//! Day-of-week numbers run 0-6 starting on Monday. Numbers, numeric ranges
//! and steps are rewritten to day names before the expression reaches the
//! `cron` crate, which numbers days from Sunday. Names pass through as is.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use cron::Schedule;

use crate::error::TriggerError;

const CRON_FIELDS: usize = 6;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Rewrite a day-of-week field from Monday-based numbers to day names.
fn weekday_names(field: &str) -> Result<String, TriggerError> {
    let invalid = || TriggerError::DayOfWeek(field.to_string());
    let number = |text: &str| {
        text.parse::<usize>()
            .ok()
            .filter(|day| *day < WEEKDAYS.len())
            .ok_or_else(invalid)
    };
    let is_numeric = |text: &str| text.chars().all(|c| c.is_ascii_digit());

    let mut items = Vec::new();
    for item in field.split(',') {
        let (base, step) = match item.split_once('/') {
            Some((base, step)) => {
                let step = step.parse::<usize>().ok().filter(|s| *s > 0).ok_or_else(invalid)?;
                (base, Some(step))
            }
            None => (item, None),
        };

        let range = match base.split_once('-') {
            _ if base == "*" && step.is_some() => Some((0, WEEKDAYS.len() - 1)),
            Some((from, to)) if is_numeric(from) && is_numeric(to) => {
                Some((number(from)?, number(to)?))
            }
            None if is_numeric(base) && !base.is_empty() => {
                let from = number(base)?;
                Some((from, if step.is_some() { WEEKDAYS.len() - 1 } else { from }))
            }
            _ => None,
        };

        match range {
            Some((from, to)) if from <= to => {
                let days: Vec<&str> = (from..=to)
                    .step_by(step.unwrap_or(1))
                    .map(|day| WEEKDAYS[day])
                    .collect();
                items.push(days.join(","));
            }
            Some(_) => return Err(invalid()),
            None => items.push(item.to_string()),
        }
    }
    Ok(items.join(","))
}

/// Which parser a trigger expression is fed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Cron,
    Interval,
    Date,
}

impl FromStr for TriggerKind {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cron" => Ok(TriggerKind::Cron),
            "interval" => Ok(TriggerKind::Interval),
            "date" => Ok(TriggerKind::Date),
            other => Err(TriggerError::UnknownKind(other.to_string())),
        }
    }
}

/// When a job fires.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Recurring, on a six-field cron schedule.
    Cron { expr: String, schedule: Box<Schedule> },
    /// Recurring, at a fixed period.
    Interval { every: TimeDelta },
    /// Once.
    Date { run_at: DateTime<Local> },
}

impl Trigger {
    /// Parse `args` according to `kind`.
    pub fn parse(kind: TriggerKind, args: &str) -> Result<Self, TriggerError> {
        match kind {
            TriggerKind::Cron => Self::cron(args),
            TriggerKind::Interval => Self::interval(args),
            TriggerKind::Date => Self::date(args),
        }
    }

    /// Parse a six-field cron expression.
    pub fn cron(args: &str) -> Result<Self, TriggerError> {
        let fields: Vec<&str> = args.split_whitespace().collect();
        if fields.len() != CRON_FIELDS {
            return Err(TriggerError::FieldCount {
                expr: args.trim().to_string(),
                found: fields.len(),
            });
        }

        let expr = fields.join(" ");
        let weekdays = weekday_names(fields[CRON_FIELDS - 1])?;
        let mut translated = fields[..CRON_FIELDS - 1].to_vec();
        translated.push(weekdays.as_str());

        let schedule =
            Schedule::from_str(&translated.join(" ")).map_err(|source| TriggerError::Cron {
                expr: expr.clone(),
                source,
            })?;

        Ok(Trigger::Cron {
            expr,
            schedule: Box::new(schedule),
        })
    }

    /// Parse a period in whole seconds.
    pub fn interval(args: &str) -> Result<Self, TriggerError> {
        let every = args
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| TriggerError::Interval(args.trim().to_string()))?;
        Ok(Trigger::Interval { every })
    }

    /// Parse a local date-time (`YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`) or an
    /// RFC 3339 timestamp.
    pub fn date(args: &str) -> Result<Self, TriggerError> {
        let text = args.trim();
        let invalid = || TriggerError::Date(text.to_string());

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(Trigger::Date {
                run_at: dt.with_timezone(&Local),
            });
        }

        let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
            })
            .map_err(|_| invalid())?;

        let run_at = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(invalid)?;
        Ok(Trigger::Date { run_at })
    }

    /// The first fire time of a newly registered job.
    ///
    /// A one-shot date already in the past fires on the next tick.
    pub fn first_fire(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        match self {
            Trigger::Date { run_at } => Some(*run_at),
            _ => self.next_after(now),
        }
    }

    /// The next fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Local>) -> Option<DateTime<Local>> {
        match self {
            Trigger::Cron { schedule, .. } => schedule.after(&after).next(),
            Trigger::Interval { every } => after.checked_add_signed(*every),
            Trigger::Date { run_at } => (*run_at > after).then_some(*run_at),
        }
    }

    /// Whether the job is dropped after it fires.
    pub fn is_one_shot(&self) -> bool {
        matches!(self, Trigger::Date { .. })
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Cron { expr, .. } => write!(f, "cron[{}]", expr),
            Trigger::Interval { every } => write!(f, "interval[{}s]", every.num_seconds()),
            Trigger::Date { run_at } => write!(f, "date[{}]", run_at.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike, Weekday};

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(y, mo, d)
                    .unwrap()
                    .and_hms_opt(h, mi, s)
                    .unwrap(),
            )
            .earliest()
            .unwrap()
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("cron".parse::<TriggerKind>().unwrap(), TriggerKind::Cron);
        assert_eq!("interval".parse::<TriggerKind>().unwrap(), TriggerKind::Interval);
        assert_eq!("date".parse::<TriggerKind>().unwrap(), TriggerKind::Date);
        assert!(matches!(
            "weekly".parse::<TriggerKind>(),
            Err(TriggerError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_cron_requires_six_fields() {
        let err = Trigger::cron("0 0 3 * *").unwrap_err();
        assert!(matches!(err, TriggerError::FieldCount { found: 5, .. }));

        let err = Trigger::cron("0 0 3 * * * 2030").unwrap_err();
        assert!(matches!(err, TriggerError::FieldCount { found: 7, .. }));

        assert!(matches!(
            Trigger::cron("   "),
            Err(TriggerError::FieldCount { found: 0, .. })
        ));
    }

    #[test]
    fn test_cron_rejects_bad_values() {
        assert!(matches!(
            Trigger::cron("0 0 25 * * *"),
            Err(TriggerError::Cron { .. })
        ));
    }

    #[test]
    fn test_cron_normalizes_whitespace() {
        let trigger = Trigger::cron("  0  30   2 * *  * ").unwrap();
        match &trigger {
            Trigger::Cron { expr, .. } => assert_eq!(expr, "0 30 2 * * *"),
            other => panic!("unexpected trigger {:?}", other),
        }
        assert_eq!(trigger.to_string(), "cron[0 30 2 * * *]");
    }

    #[test]
    fn test_cron_next_after_is_local_time() {
        let trigger = Trigger::cron("0 30 2 * * *").unwrap();
        let after = local(2030, 6, 1, 12, 0, 0);
        let next = trigger.next_after(after).unwrap();
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2030, 6, 2).unwrap());
        assert_eq!((next.hour(), next.minute(), next.second()), (2, 30, 0));
    }

    #[test]
    fn test_cron_next_is_strictly_after() {
        let trigger = Trigger::cron("0 0 * * * *").unwrap();
        let on_the_hour = local(2030, 6, 1, 10, 0, 0);
        let next = trigger.next_after(on_the_hour).unwrap();
        assert_eq!(next, local(2030, 6, 1, 11, 0, 0));
    }

    fn weekdays_after(expr: &str, count: usize) -> Vec<Weekday> {
        let trigger = Trigger::cron(expr).unwrap();
        let mut at = local(2030, 6, 1, 12, 0, 0);
        let mut days = Vec::new();
        for _ in 0..count {
            at = trigger.next_after(at).unwrap();
            days.push(at.weekday());
        }
        days
    }

    #[test]
    fn test_weekday_zero_is_monday() {
        assert_eq!(weekdays_after("0 0 2 * * 0", 3), vec![Weekday::Mon; 3]);
        assert_eq!(weekdays_after("0 0 2 * * 1", 3), vec![Weekday::Tue; 3]);
        assert_eq!(weekdays_after("0 0 2 * * 6", 2), vec![Weekday::Sun; 2]);
    }

    #[test]
    fn test_weekday_range_is_working_week() {
        let days = weekdays_after("0 0 2 * * 0-4", 7);
        assert_eq!(
            days,
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Mon,
                Weekday::Tue,
            ]
        );
    }

    #[test]
    fn test_weekday_field_rewrites() {
        assert_eq!(weekday_names("*").unwrap(), "*");
        assert_eq!(weekday_names("5-6").unwrap(), "Sat,Sun");
        assert_eq!(weekday_names("*/2").unwrap(), "Mon,Wed,Fri,Sun");
        assert_eq!(weekday_names("4/2").unwrap(), "Fri,Sun");
        assert_eq!(weekday_names("0,3").unwrap(), "Mon,Thu");
        assert_eq!(weekday_names("Mon-Fri").unwrap(), "Mon-Fri");
        assert!(matches!(weekday_names("7"), Err(TriggerError::DayOfWeek(_))));
        assert!(matches!(weekday_names("4-1"), Err(TriggerError::DayOfWeek(_))));
    }

    #[test]
    fn test_weekday_keeps_expression_for_display() {
        let trigger = Trigger::cron("0 0 2 * * 0-4").unwrap();
        assert_eq!(trigger.to_string(), "cron[0 0 2 * * 0-4]");
    }

    #[test]
    fn test_interval() {
        let trigger = Trigger::parse(TriggerKind::Interval, " 90 ").unwrap();
        let now = local(2030, 1, 1, 0, 0, 0);
        assert_eq!(trigger.next_after(now), Some(local(2030, 1, 1, 0, 1, 30)));
        assert!(!trigger.is_one_shot());

        assert!(matches!(Trigger::interval("0"), Err(TriggerError::Interval(_))));
        assert!(matches!(Trigger::interval("soon"), Err(TriggerError::Interval(_))));
    }

    #[test]
    fn test_date_formats() {
        let expected = local(2030, 3, 4, 5, 6, 7);
        let trigger = Trigger::date("2030-03-04 05:06:07").unwrap();
        assert!(matches!(trigger, Trigger::Date { run_at } if run_at == expected));

        let midnight = Trigger::date("2030-03-04").unwrap();
        assert!(
            matches!(midnight, Trigger::Date { run_at } if run_at == local(2030, 3, 4, 0, 0, 0))
        );

        assert!(Trigger::date("2030-03-04T05:06:07Z").is_ok());
        assert!(matches!(Trigger::date("tomorrow"), Err(TriggerError::Date(_))));
    }

    #[test]
    fn test_date_fires_once() {
        let run_at = local(2030, 3, 4, 5, 0, 0);
        let trigger = Trigger::Date { run_at };
        assert!(trigger.is_one_shot());
        assert_eq!(trigger.next_after(local(2030, 3, 4, 4, 0, 0)), Some(run_at));
        assert_eq!(trigger.next_after(run_at), None);
        // A past date still fires once when first registered.
        assert_eq!(trigger.first_fire(local(2031, 1, 1, 0, 0, 0)), Some(run_at));
    }
}
