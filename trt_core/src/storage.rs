//! Tracker state persistence with file locking.
//!
//! The full state aggregate lives in a single JSON file. Loads degrade to
//! the empty default state on any failure (missing, unreadable, or corrupt
//! file) so a bad blob can never take the tracker down; saves are atomic
//! via a temp file rename.

use crate::{Error, Result, TrackerState};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl TrackerState {
    /// Load tracker state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<TrackerState>(&contents) {
            Ok(state) => {
                tracing::debug!(
                    "Loaded {} entries and {} regimens from {:?}",
                    state.entries.len(),
                    state.regimens.len(),
                    path
                );
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save tracker state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "state path missing parent")
        })?)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old state file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved tracker state to {:?}", path);
        Ok(())
    }

    /// Load state, apply a mutation, and save it back atomically
    ///
    /// Convenience wrapper for the load-transition-save pattern every
    /// mutating command follows.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&TrackerState) -> TrackerState,
    {
        let state = Self::load(path)?;
        let next = f(&state);
        next.save(path)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{apply, Action};
    use crate::types::{Entry, Regimen};
    use chrono::{TimeZone, Utc};

    fn sample_state() -> TrackerState {
        let mut state = apply(
            &TrackerState::default(),
            Action::AddRegimen(Regimen {
                id: "r1".into(),
                name: "Enanthate weekly".into(),
                preparation: "Testosterone enanthate".into(),
                route: "IM".into(),
                dosage_mg: 100.0,
                interval_days: 7,
                start_date: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
                target_level: Some(650.0),
                notes: None,
            }),
        );
        state = apply(
            &state,
            Action::AddEntry(Entry::dose(
                "d1".into(),
                Utc.with_ymd_and_hms(2024, 1, 8, 8, 0, 0).unwrap(),
                Some("r1".into()),
                100.0,
                Some("Enanthate".into()),
                None,
            )),
        );
        apply(
            &state,
            Action::AddEntry(Entry::lab(
                "l1".into(),
                Utc.with_ymd_and_hms(2024, 1, 20, 9, 0, 0).unwrap(),
                512.5,
                None,
                Some("morning draw".into()),
            )),
        )
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        let state = sample_state();
        state.save(&state_path).unwrap();

        let loaded = TrackerState::load(&state_path).unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("nonexistent.json");

        let state = TrackerState::load(&state_path).unwrap();
        assert!(state.entries.is_empty());
        assert!(state.regimens.is_empty());
    }

    #[test]
    fn test_corrupted_state_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("corrupted.json");

        // Write invalid JSON
        std::fs::write(&state_path, "{ invalid json }").unwrap();

        let state = TrackerState::load(&state_path).unwrap();
        assert!(state.entries.is_empty());
        assert!(state.regimens.is_empty());
    }

    #[test]
    fn test_serialized_shape_uses_camel_case_tags() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        sample_state().save(&state_path).unwrap();

        let raw = std::fs::read_to_string(&state_path).unwrap();
        assert!(raw.contains("\"eventType\":\"dose\""));
        assert!(raw.contains("\"levelNgDl\""));
        assert!(raw.contains("\"intervalDays\""));
        // Absent optional fields are omitted entirely
        assert!(!raw.contains("wellbeingScore"));
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        sample_state().save(&state_path).unwrap();

        TrackerState::update(&state_path, |state| {
            apply(state, Action::DeleteEntry("d1".into()))
        })
        .unwrap();

        let loaded = TrackerState::load(&state_path).unwrap();
        assert!(loaded.entries.iter().all(|e| e.id != "d1"));
        assert_eq!(loaded.entries.len(), 1);
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        TrackerState::default().save(&state_path).unwrap();

        // Verify state file exists and no stray temp files remain
        assert!(state_path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "state.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only state.json, found extras: {:?}",
            extras
        );
    }
}
