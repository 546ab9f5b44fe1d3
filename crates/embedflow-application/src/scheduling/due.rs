//! Due-instance computation.
//!
//! Cron expressions are interpreted in the task owner's timezone: the
//! iterator is seeded with the base instant converted to that zone and
//! every yielded wall time is mapped back to UTC for comparison, so DST
//! transitions are handled by the timezone database rather than by offset
//! arithmetic.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use embedflow_domain::constants::{DUE_BACKLOG_KEEP, DUE_BACKLOG_LIMIT};
use embedflow_domain::entities::DateRange;
use embedflow_domain::error::{Error, Result};
use tracing::warn;

/// Due cron instances of a task, in UTC, earliest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueInstances {
    /// Instances strictly after the base (and after `last_checked`, when
    /// set) and at or before `now`
    pub instances: Vec<DateTime<Utc>>,
    /// Whether the safety cap truncated the backlog
    pub capped: bool,
}

impl DueInstances {
    /// The earliest due instance, if any.
    #[must_use]
    pub fn earliest(&self) -> Option<DateTime<Utc>> {
        self.instances.first().copied()
    }
}

/// Parse an IANA timezone name, falling back to `default_tz` (and then to
/// UTC) when the name is absent or invalid.
#[must_use]
pub fn parse_timezone(name: Option<&str>, default_tz: &str) -> Tz {
    if let Some(name) = name {
        match name.parse::<Tz>() {
            Ok(tz) => return tz,
            Err(_) => warn!(timezone = %name, "Invalid timezone, using default"),
        }
    }
    default_tz.parse::<Tz>().unwrap_or(Tz::UTC)
}

/// Interpret one date-range boundary in the user's timezone.
///
/// A date-only string (`YYYY-MM-DD`) maps to the start of that day for
/// `end = false` and to `23:59:59.999` for `end = true`; a full datetime is
/// parsed as written and coerced to UTC.
fn parse_boundary(raw: &str, tz: Tz, end: bool) -> Result<DateTime<Utc>> {
    let is_date_only = raw.len() == 10 && raw.matches('-').count() == 2;
    if is_date_only {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| Error::scheduler(format!("invalid date '{raw}': {e}")))?;
        let naive = if end {
            date.and_hms_milli_opt(23, 59, 59, 999)
        } else {
            date.and_hms_opt(0, 0, 0)
        }
        .ok_or_else(|| Error::scheduler(format!("invalid date '{raw}'")))?;
        let local = tz
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| Error::scheduler(format!("date '{raw}' does not exist in timezone")))?;
        return Ok(local.with_timezone(&Utc));
    }

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| Error::scheduler(format!("invalid datetime '{raw}': {e}")))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Whether `now` falls inside the task's activity window. Both bounds are
/// inclusive.
///
/// # Errors
///
/// Returns an error when a boundary cannot be parsed; the caller skips the
/// task (fail-safe).
pub fn within_date_range(range: Option<&DateRange>, now: DateTime<Utc>, tz: Tz) -> Result<bool> {
    let Some(range) = range else {
        return Ok(true);
    };

    if let Some(raw) = range.start_date.as_deref().filter(|raw| !raw.is_empty()) {
        let start = parse_boundary(raw, tz, false)?;
        if now < start {
            return Ok(false);
        }
    }
    if let Some(raw) = range.end_date.as_deref().filter(|raw| !raw.is_empty()) {
        let end = parse_boundary(raw, tz, true)?;
        if now > end {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Normalize a five-field cron expression to the six-field form the cron
/// library expects by pinning the seconds column to zero.
fn normalize_cron(expression: &str) -> String {
    let fields = expression.split_whitespace().count();
    if fields == 5 {
        format!("0 {expression}")
    } else {
        expression.to_owned()
    }
}

/// Enumerate all due instances of a cron expression: fire times strictly
/// after `base` (and after `last_checked`, when set) and at or before
/// `now`, computed in the user's timezone. A backlog beyond
/// [`DUE_BACKLOG_LIMIT`] is truncated to the [`DUE_BACKLOG_KEEP`] most
/// recent instances with a warning.
///
/// # Errors
///
/// Returns an error when the cron expression does not parse.
pub fn due_instances(
    expression: &str,
    base: DateTime<Utc>,
    now: DateTime<Utc>,
    last_checked: Option<DateTime<Utc>>,
    tz: Tz,
) -> Result<DueInstances> {
    let schedule = Schedule::from_str(&normalize_cron(expression))
        .map_err(|e| Error::scheduler(format!("invalid cron expression '{expression}': {e}")))?;

    let base_local = base.with_timezone(&tz);
    let mut instances = Vec::new();
    let mut capped = false;

    for fire_local in schedule.after(&base_local) {
        let fire_utc = fire_local.with_timezone(&Utc);
        if fire_utc > now {
            break;
        }
        if last_checked.is_none_or(|checked| fire_utc > checked) {
            instances.push(fire_utc);
        }
        if instances.len() > DUE_BACKLOG_LIMIT {
            warn!(
                cron = %expression,
                "Over {DUE_BACKLOG_LIMIT} due instances, keeping the most recent {DUE_BACKLOG_KEEP}"
            );
            let skip = instances.len() - DUE_BACKLOG_KEEP;
            instances.drain(..skip);
            capped = true;
            break;
        }
    }

    Ok(DueInstances { instances, capped })
}
