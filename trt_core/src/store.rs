//! Pure entity store: `(state, action) -> state` transitions.
//!
//! Every transition is total over well-typed input and copy-on-write: the
//! old state is never edited in place, so readers holding a previous state
//! never observe a partial update. Deleting an id that does not exist is a
//! silent no-op, never an error. Callers supply fresh ids; the store does
//! not generate or check them.

use crate::types::{Entry, Regimen, RegimenPatch, TrackerState};

/// A state transition request
#[derive(Clone, Debug)]
pub enum Action {
    /// Prepend a new entry (entries display newest-first)
    AddEntry(Entry),
    /// Remove the entry with the given id, if present
    DeleteEntry(String),
    /// Append a new regimen
    AddRegimen(Regimen),
    /// Merge the given fields into the matching regimen, if present
    UpdateRegimen { id: String, patch: RegimenPatch },
    /// Remove the regimen and every dose entry referencing it
    DeleteRegimen(String),
    /// Return to the empty default state
    Reset,
}

/// Apply an action, producing the next state
pub fn apply(state: &TrackerState, action: Action) -> TrackerState {
    match action {
        Action::AddEntry(entry) => {
            let mut entries = Vec::with_capacity(state.entries.len() + 1);
            entries.push(entry);
            entries.extend(state.entries.iter().cloned());
            TrackerState {
                entries,
                regimens: state.regimens.clone(),
            }
        }
        Action::DeleteEntry(id) => TrackerState {
            entries: state
                .entries
                .iter()
                .filter(|entry| entry.id != id)
                .cloned()
                .collect(),
            regimens: state.regimens.clone(),
        },
        Action::AddRegimen(regimen) => {
            let mut regimens = state.regimens.clone();
            regimens.push(regimen);
            TrackerState {
                entries: state.entries.clone(),
                regimens,
            }
        }
        Action::UpdateRegimen { id, patch } => TrackerState {
            entries: state.entries.clone(),
            regimens: state
                .regimens
                .iter()
                .map(|regimen| {
                    if regimen.id == id {
                        merge_patch(regimen, &patch)
                    } else {
                        regimen.clone()
                    }
                })
                .collect(),
        },
        // Cascade: there is no referential-integrity engine underneath, so
        // the foreign-key cleanup is an explicit filter over both collections.
        Action::DeleteRegimen(id) => TrackerState {
            entries: state
                .entries
                .iter()
                .filter(|entry| entry.regimen_id.as_deref() != Some(id.as_str()))
                .cloned()
                .collect(),
            regimens: state
                .regimens
                .iter()
                .filter(|regimen| regimen.id != id)
                .cloned()
                .collect(),
        },
        Action::Reset => TrackerState::default(),
    }
}

fn merge_patch(regimen: &Regimen, patch: &RegimenPatch) -> Regimen {
    Regimen {
        id: regimen.id.clone(),
        name: patch.name.clone().unwrap_or_else(|| regimen.name.clone()),
        preparation: patch
            .preparation
            .clone()
            .unwrap_or_else(|| regimen.preparation.clone()),
        route: patch.route.clone().unwrap_or_else(|| regimen.route.clone()),
        dosage_mg: patch.dosage_mg.unwrap_or(regimen.dosage_mg),
        interval_days: patch.interval_days.unwrap_or(regimen.interval_days),
        start_date: patch.start_date.unwrap_or(regimen.start_date),
        target_level: patch.target_level.or(regimen.target_level),
        notes: patch.notes.clone().or_else(|| regimen.notes.clone()),
    }
}
