//! Statistics aggregator: rolling summary metrics over the entry history.

use crate::query::{calendar_days_between, of_type, sort_by_date_desc, within_days};
use crate::types::{Entry, EventType, Regimen, StatsSnapshot, UpcomingDose};
use chrono::{DateTime, Utc};

/// Trailing window for lab-level averaging and trend, in days
pub const LAB_WINDOW_DAYS: i64 = 30;

/// Trailing observation window for adherence, in days
pub const OBSERVATION_WINDOW_DAYS: i64 = 90;

/// Compute the statistics snapshot.
///
/// `upcoming` must be the projector output for the same `entries` and the
/// same `now`, otherwise the next-dose selection can disagree with the
/// overdue flags.
///
/// Adherence counts doses logged in the trailing 90 days against an
/// expected count of `floor((90 - days_since_start) / interval_days)` per
/// regimen. Note the subtraction: a regimen started long ago contributes
/// fewer expected doses as time passes, and none once the subtraction goes
/// non-positive. That is a known simplification carried over from the
/// original behavior, kept verbatim for compatibility.
pub fn snapshot(
    regimens: &[Regimen],
    entries: &[Entry],
    upcoming: &[UpcomingDose],
    now: DateTime<Utc>,
) -> StatsSnapshot {
    let last_dose_date = sort_by_date_desc(entries)
        .into_iter()
        .find(|entry| entry.event_type == EventType::Dose)
        .map(|entry| entry.date);

    // Lab window: levels recorded in the trailing 30 days, oldest first
    let mut labs = of_type(&within_days(entries, now, LAB_WINDOW_DAYS), EventType::Lab);
    labs.retain(|entry| entry.level_ng_dl.is_some());
    labs.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let levels: Vec<f64> = labs.iter().filter_map(|entry| entry.level_ng_dl).collect();

    let average_level_30d = if levels.is_empty() {
        None
    } else {
        Some(levels.iter().sum::<f64>() / levels.len() as f64)
    };

    // Last two chronological points only, not a regression over the window
    let level_trend_delta = match levels.as_slice() {
        [.., previous, latest] => Some(latest - previous),
        _ => None,
    };

    let doses_in_window = of_type(
        &within_days(entries, now, OBSERVATION_WINDOW_DAYS),
        EventType::Dose,
    )
    .len();

    let expected_doses: i64 = regimens
        .iter()
        .map(|regimen| {
            if regimen.interval_days == 0 {
                return 0;
            }
            let days = OBSERVATION_WINDOW_DAYS - calendar_days_between(regimen.start_date, now);
            if days <= 0 {
                0
            } else {
                (days / i64::from(regimen.interval_days)).max(0)
            }
        })
        .sum();

    // Clamped at 1: over-dosing is never rewarded. When nothing is expected
    // (no regimens, or all newly started) adherence is perfect by default.
    let adherence_rate = if expected_doses > 0 {
        (doses_in_window as f64 / expected_doses as f64).min(1.0)
    } else {
        1.0
    };

    tracing::debug!(
        doses_in_window,
        expected_doses,
        adherence_rate,
        "computed adherence over {} day window",
        OBSERVATION_WINDOW_DAYS
    );

    // First non-overdue projected dose; if everything is overdue, fall back
    // to the earliest occurrence so there is still something to show
    let next_dose_date = upcoming
        .iter()
        .find(|dose| !dose.overdue)
        .or_else(|| upcoming.first())
        .map(|dose| dose.date);

    StatsSnapshot {
        last_dose_date,
        next_dose_date,
        average_level_30d,
        labs_count_30d: labs.len(),
        level_trend_delta,
        adherence_rate,
    }
}
