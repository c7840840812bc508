//! Core domain types for the trt therapy tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Entries (recorded dose, lab, and wellbeing events)
//! - Regimens (recurring dosing plans)
//! - Derived views (upcoming doses, statistics snapshot)
//! - The persisted state aggregate
//!
//! Everything serializes with camelCase field names and lowercase event
//! tags so that the persisted JSON blob keeps the original state shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Entry Types
// ============================================================================

/// Kind of recorded event
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Dose,
    Lab,
    Symptom,
}

/// A single recorded historical event.
///
/// Exactly one of `dosage_mg`, `level_ng_dl`, `wellbeing_score` is
/// populated, matching `event_type`. Entries are immutable after creation;
/// the only lifecycle operation is deletion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub event_type: EventType,
    /// When the event occurred, not when it was recorded
    pub date: DateTime<Utc>,
    /// Back-reference to a regimen; only meaningful for dose events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regimen_id: Option<String>,
    /// Free-text drug/preparation label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage_mg: Option<f64>,
    /// Measured testosterone concentration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_ng_dl: Option<f64>,
    /// Subjective wellbeing, 1 to 10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wellbeing_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Entry {
    /// Create a dose event
    pub fn dose(
        id: String,
        date: DateTime<Utc>,
        regimen_id: Option<String>,
        dosage_mg: f64,
        product: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Entry {
            id,
            event_type: EventType::Dose,
            date,
            regimen_id,
            product,
            dosage_mg: Some(dosage_mg),
            level_ng_dl: None,
            wellbeing_score: None,
            notes,
        }
    }

    /// Create a lab result event
    pub fn lab(
        id: String,
        date: DateTime<Utc>,
        level_ng_dl: f64,
        product: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Entry {
            id,
            event_type: EventType::Lab,
            date,
            regimen_id: None,
            product,
            dosage_mg: None,
            level_ng_dl: Some(level_ng_dl),
            wellbeing_score: None,
            notes,
        }
    }

    /// Create a subjective wellbeing event
    pub fn wellbeing(
        id: String,
        date: DateTime<Utc>,
        score: u8,
        notes: Option<String>,
    ) -> Self {
        Entry {
            id,
            event_type: EventType::Symptom,
            date,
            regimen_id: None,
            product: None,
            dosage_mg: None,
            level_ng_dl: None,
            wellbeing_score: Some(score),
            notes,
        }
    }
}

// ============================================================================
// Regimen Types
// ============================================================================

/// A recurring dosing plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Regimen {
    pub id: String,
    pub name: String,
    pub preparation: String,
    /// Administration route (IM, SC, Transdermal, Oral, ...) - open set,
    /// not validated here
    pub route: String,
    /// Planned dose per administration
    pub dosage_mg: f64,
    /// Days between scheduled administrations
    pub interval_days: u32,
    /// Anchor instant before any dose entries exist
    pub start_date: DateTime<Utc>,
    /// Target lab concentration, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update to a regimen; `None` fields are left unchanged
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimenPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ============================================================================
// Derived View Types (never persisted)
// ============================================================================

/// A projected future dose occurrence.
///
/// The `id` is recomputed from the regimen id and occurrence index on every
/// projection call; treat it as an ephemeral view key, not a durable
/// identifier.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingDose {
    pub id: String,
    pub regimen_id: String,
    /// Regimen name snapshot at projection time
    pub regimen_name: String,
    pub date: DateTime<Utc>,
    pub overdue: bool,
    /// Whole calendar days until the occurrence; negative when overdue
    pub days_until: i64,
}

/// Rolling summary metrics over the entry history
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub last_dose_date: Option<DateTime<Utc>>,
    pub next_dose_date: Option<DateTime<Utc>>,
    pub average_level_30d: Option<f64>,
    pub labs_count_30d: usize,
    /// Most recent lab level minus the one before it; positive = rising
    pub level_trend_delta: Option<f64>,
    /// Doses taken over doses expected in the trailing window, in [0, 1]
    pub adherence_rate: f64,
}

// ============================================================================
// State Aggregate
// ============================================================================

/// The full persisted state.
///
/// Canonical order is insertion order; reverse-chronological display sorting
/// is a read-time concern (see `query`).
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub entries: Vec<Entry>,
    pub regimens: Vec<Regimen>,
}
