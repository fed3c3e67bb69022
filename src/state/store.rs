use tracing::{error, info, warn};

use super::data::{LegacyPattern, Pattern};
use super::error::StoreResult;
use super::preferences::{KeyValueStore, PATTERNS_KEY};

/// Durable storage of the pattern list.
///
/// The whole list lives in one blob; every save is a full snapshot.
pub struct PatternStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> PatternStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Load the stored list, migrating blobs written in the legacy schema.
    ///
    /// Never fails: an unreadable blob yields an empty list.
    pub fn load(&self) -> Vec<Pattern> {
        let raw = match self.backend.get(PATTERNS_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return Vec::new(),
            Err(e) => {
                error!(error = %e, "failed to read stored patterns");
                return Vec::new();
            }
        };

        let current_err = match decode_current(&raw) {
            Ok(patterns) => return patterns,
            Err(e) => e,
        };

        match decode_legacy(&raw) {
            Ok(migrated) => {
                info!(count = migrated.len(), "migrated patterns from legacy schema");
                self.save(&migrated);
                migrated
            }
            Err(legacy_err) => {
                warn!(
                    current = %current_err,
                    legacy = %legacy_err,
                    "failed to decode or migrate stored patterns, starting empty"
                );
                Vec::new()
            }
        }
    }

    /// Overwrite the stored list. Failures are logged and the previous blob stays.
    pub fn save(&self, patterns: &[Pattern]) {
        if let Err(e) = self.try_save(patterns) {
            error!(error = %e, count = patterns.len(), "failed to save patterns");
        }
    }

    fn try_save(&self, patterns: &[Pattern]) -> StoreResult<()> {
        let encoded = encode(patterns)?;
        self.backend.set(PATTERNS_KEY, &encoded)
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &S {
        &self.backend
    }
}

pub fn encode(patterns: &[Pattern]) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(patterns)?)
}

pub fn decode_current(raw: &[u8]) -> StoreResult<Vec<Pattern>> {
    Ok(serde_json::from_slice(raw)?)
}

pub fn decode_legacy(raw: &[u8]) -> StoreResult<Vec<Pattern>> {
    let old: Vec<LegacyPattern> = serde_json::from_slice(raw)?;
    Ok(old.into_iter().map(Pattern::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::preferences::testing::MemoryStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample() -> Vec<Pattern> {
        let mut first = Pattern::new("Bunny", vec![1, 2, 3]);
        first.start_date = Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap());
        first.stitch_images = vec![vec![4], vec![5, 6]];
        first.is_starred = true;
        let mut second = Pattern::new("Coaster", vec![8]);
        second.current_round = 7;
        second.marker_x_ratio = 0.125;
        vec![first, second]
    }

    fn legacy_blob(is_finished: bool) -> Vec<u8> {
        serde_json::to_vec(&json!([{
            "id": "E621E1F8-C36C-495A-93FC-0C247A3E6E5F",
            "name": "Old bag",
            "imageData": "AAEC",
            "hookSize": 4.0,
            "yarn": "cotton",
            "notes": "",
            "currentRound": 3,
            "currentStitch": 12,
            "markerXRatio": 0.2,
            "markerYRatio": 0.8,
            "isFinished": is_finished,
            "startDate": 700000000.0
        }]))
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let patterns = sample();
        let encoded = encode(&patterns).unwrap();
        assert_eq!(decode_current(&encoded).unwrap(), patterns);
    }

    #[test]
    fn test_empty_or_absent_blob_loads_empty() {
        let store = PatternStore::new(MemoryStore::default());
        assert!(store.load().is_empty());

        let store = PatternStore::new(MemoryStore::with_value(PATTERNS_KEY, b""));
        assert!(store.load().is_empty());
        assert_eq!(store.backend().writes.get(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let store = PatternStore::new(MemoryStore::default());
        let patterns = sample();
        store.save(&patterns);
        assert_eq!(store.load(), patterns);
    }

    #[test]
    fn test_legacy_blob_is_migrated_and_rewritten() {
        let store = PatternStore::new(MemoryStore::with_value(PATTERNS_KEY, &legacy_blob(true)));
        let loaded = store.load();

        assert_eq!(loaded.len(), 1);
        let pattern = &loaded[0];
        assert!(pattern.is_in_works);
        assert!(!pattern.is_starred);
        assert!(pattern.stitch_images.is_empty());
        assert_eq!(pattern.image_data, vec![0, 1, 2]);
        assert_eq!(pattern.current_stitch, 12);
        assert!(pattern.start_date.is_some());

        // The slot now holds the current schema
        assert_eq!(store.backend().writes.get(), 1);
        let raw = store.backend().raw(PATTERNS_KEY).unwrap();
        assert_eq!(decode_current(&raw).unwrap(), loaded);
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value[0]["isInWorks"], true);
        assert!(value[0].get("isFinished").is_none());
    }

    #[test]
    fn test_legacy_unfinished_maps_to_library() {
        let store = PatternStore::new(MemoryStore::with_value(PATTERNS_KEY, &legacy_blob(false)));
        let loaded = store.load();
        assert!(!loaded[0].is_in_works);
    }

    #[test]
    fn test_garbage_blob_loads_empty_without_rewrite() {
        let store = PatternStore::new(MemoryStore::with_value(PATTERNS_KEY, b"{not json"));
        assert!(store.load().is_empty());
        assert_eq!(store.backend().writes.get(), 0);
        assert_eq!(store.backend().raw(PATTERNS_KEY).unwrap(), b"{not json".to_vec());
    }

    #[test]
    fn test_failed_save_keeps_previous_blob() {
        let store = PatternStore::new(MemoryStore::default());
        let patterns = sample();
        store.save(&patterns);

        store.backend().fail_writes.set(true);
        store.save(&patterns[..1]);
        assert_eq!(store.load(), patterns);
    }
}
