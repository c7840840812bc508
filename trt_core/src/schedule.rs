//! Schedule projector: derive upcoming dose occurrences from regimens.
//!
//! A pure function of its inputs, including `now`, which callers sample
//! exactly once per computation so overdue flags and day counts stay
//! mutually consistent.

use crate::query::calendar_days_between;
use crate::types::{Entry, EventType, Regimen, UpcomingDose};
use chrono::{DateTime, Days, Utc};

/// Project the next `per_regimen` dose occurrences for every regimen.
///
/// Per regimen, the anchor is the most recent dose entry referencing it
/// (ties on date break on entry id, so the result does not depend on
/// insertion order), or `start_date` when no dose has been logged yet. Each
/// occurrence advances the anchor by `interval_days` calendar days; the
/// anchor itself is never reported, so a fresh regimen's first occurrence
/// is `start_date + interval_days`.
///
/// The flattened result is sorted ascending by date across regimens.
pub fn upcoming_doses(
    regimens: &[Regimen],
    entries: &[Entry],
    now: DateTime<Utc>,
    per_regimen: usize,
) -> Vec<UpcomingDose> {
    let dose_entries: Vec<&Entry> = entries
        .iter()
        .filter(|entry| entry.event_type == EventType::Dose)
        .collect();

    let mut upcoming = Vec::with_capacity(regimens.len() * per_regimen);

    for regimen in regimens {
        if regimen.interval_days == 0 {
            tracing::warn!(
                "Regimen {} has a zero-day interval; skipping projection",
                regimen.id
            );
            continue;
        }

        let anchor = dose_entries
            .iter()
            .filter(|entry| entry.regimen_id.as_deref() == Some(regimen.id.as_str()))
            .max_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)))
            .map(|entry| entry.date)
            .unwrap_or(regimen.start_date);

        let mut date = anchor;
        for index in 0..per_regimen {
            date = match date.checked_add_days(Days::new(u64::from(regimen.interval_days))) {
                Some(next) => next,
                None => {
                    tracing::warn!(
                        "Regimen {} projection overflowed the calendar; stopping early",
                        regimen.id
                    );
                    break;
                }
            };

            upcoming.push(UpcomingDose {
                id: format!("{}-{}", regimen.id, index),
                regimen_id: regimen.id.clone(),
                regimen_name: regimen.name.clone(),
                date,
                overdue: date < now,
                days_until: calendar_days_between(now, date),
            });
        }
    }

    upcoming.sort_by(|a, b| a.date.cmp(&b.date));
    upcoming
}
