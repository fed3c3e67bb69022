/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the preference area and the UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::wire;

/// Marker position used whenever none has been recorded yet (image center)
pub const DEFAULT_MARKER_RATIO: f64 = 0.5;

/// Clamp a normalized coordinate into [0, 1]
pub fn clamp_ratio(value: f64) -> f64 {
    if value.is_nan() {
        return DEFAULT_MARKER_RATIO;
    }
    value.clamp(0.0, 1.0)
}

/// Floor a counter input at zero
pub fn floor_counter(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// One user-created catalog entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    /// Generated at creation, never reassigned
    #[serde(with = "wire::uuid_upper")]
    pub id: Uuid,
    pub name: String,
    /// Finished-work photo, always present
    #[serde(with = "wire::base64_bytes")]
    pub image_data: Vec<u8>,
    /// Hook size in millimeters (one of the hook table values)
    pub hook_size: f64,
    pub yarn: String,
    pub notes: String,
    pub current_round: u32,
    pub current_stitch: u32,
    /// Normalized marker position within the primary image, in [0, 1]
    pub marker_x_ratio: f64,
    pub marker_y_ratio: f64,
    /// Shown in the works gallery instead of the library collection
    pub is_in_works: bool,
    pub is_starred: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire::reference_date_opt"
    )]
    pub start_date: Option<DateTime<Utc>>,
    /// Auxiliary stitch/diagram images, in display order
    #[serde(with = "wire::base64_list")]
    pub stitch_images: Vec<Vec<u8>>,
}

impl Pattern {
    /// Create a pattern with a fresh id and default progress
    pub fn new(name: impl Into<String>, image_data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            image_data,
            hook_size: 3.0,
            yarn: String::new(),
            notes: String::new(),
            current_round: 0,
            current_stitch: 0,
            marker_x_ratio: DEFAULT_MARKER_RATIO,
            marker_y_ratio: DEFAULT_MARKER_RATIO,
            is_in_works: false,
            is_starred: false,
            start_date: None,
            stitch_images: Vec::new(),
        }
    }

    /// Reset counters and marker to their initial values
    pub fn reset_progress(&mut self) {
        self.current_round = 0;
        self.current_stitch = 0;
        self.marker_x_ratio = DEFAULT_MARKER_RATIO;
        self.marker_y_ratio = DEFAULT_MARKER_RATIO;
    }

    /// Number of displayable images (primary first, then stitch images)
    pub fn image_count(&self) -> usize {
        1 + self.stitch_images.len()
    }

    /// Key of this pattern in the workspace state map
    pub fn workspace_key(&self) -> String {
        self.id.hyphenated().to_string().to_uppercase()
    }
}

/// Record shape written before the works/starred split
///
/// Only used to read old blobs; it is never written.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPattern {
    #[serde(with = "wire::uuid_upper")]
    pub id: Uuid,
    pub name: String,
    #[serde(with = "wire::base64_bytes")]
    pub image_data: Vec<u8>,
    pub hook_size: f64,
    pub yarn: String,
    pub notes: String,
    pub current_round: u32,
    pub current_stitch: u32,
    pub marker_x_ratio: f64,
    pub marker_y_ratio: f64,
    pub is_finished: bool,
    #[serde(default, with = "wire::reference_date_opt")]
    pub start_date: Option<DateTime<Utc>>,
}

impl From<LegacyPattern> for Pattern {
    fn from(old: LegacyPattern) -> Self {
        Self {
            id: old.id,
            name: old.name,
            image_data: old.image_data,
            hook_size: old.hook_size,
            yarn: old.yarn,
            notes: old.notes,
            current_round: old.current_round,
            current_stitch: old.current_stitch,
            marker_x_ratio: old.marker_x_ratio,
            marker_y_ratio: old.marker_y_ratio,
            is_in_works: old.is_finished,
            is_starred: false,
            start_date: old.start_date,
            stitch_images: Vec::new(),
        }
    }
}

/// Normalized marker position on one image
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            x: DEFAULT_MARKER_RATIO,
            y: DEFAULT_MARKER_RATIO,
        }
    }
}

impl Marker {
    /// Build a marker with both coordinates clamped into [0, 1]
    pub fn clamped(x: f64, y: f64) -> Self {
        Self {
            x: clamp_ratio(x),
            y: clamp_ratio(y),
        }
    }
}

/// Viewing state of one catalog entry, kept apart from the pattern record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkspaceState {
    pub round: u32,
    pub stitch: u32,
    /// One marker per image: main image first, then stitch images
    pub markers: Vec<Marker>,
}

impl WorkspaceState {
    /// Fresh state with one default marker per image (at least one)
    pub fn for_images(image_count: usize) -> Self {
        Self {
            round: 0,
            stitch: 0,
            markers: vec![Marker::default(); image_count.max(1)],
        }
    }

    /// Marker at `index`, or the default when none was stored yet
    pub fn marker(&self, index: usize) -> Marker {
        self.markers.get(index).copied().unwrap_or_default()
    }

    /// Mutable marker at `index`, growing the list with defaults as needed
    pub fn marker_mut(&mut self, index: usize) -> &mut Marker {
        if index >= self.markers.len() {
            self.markers.resize(index + 1, Marker::default());
        }
        &mut self.markers[index]
    }

    /// Store a marker position, clamped into the image
    pub fn set_marker(&mut self, index: usize, x: f64, y: f64) {
        *self.marker_mut(index) = Marker::clamped(x, y);
    }

    pub fn set_round(&mut self, round: i64) {
        self.round = floor_counter(round);
    }

    pub fn set_stitch(&mut self, stitch: i64) {
        self.stitch = floor_counter(stitch);
    }

    /// Back to the fresh state for `image_count` images
    pub fn reset(&mut self, image_count: usize) {
        *self = Self::for_images(image_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pattern_defaults() {
        let pattern = Pattern::new("Granny square", vec![1, 2, 3]);
        assert_eq!(pattern.current_round, 0);
        assert_eq!(pattern.current_stitch, 0);
        assert_eq!(pattern.marker_x_ratio, 0.5);
        assert_eq!(pattern.marker_y_ratio, 0.5);
        assert!(!pattern.is_in_works);
        assert!(!pattern.is_starred);
        assert_eq!(pattern.image_count(), 1);
    }

    #[test]
    fn test_field_names_and_encodings() {
        let mut pattern = Pattern::new("Bear", vec![0xFF, 0xD8]);
        pattern.stitch_images = vec![vec![1, 2]];
        let json = serde_json::to_value(&pattern).unwrap();
        let object = json.as_object().unwrap();

        for key in [
            "id",
            "name",
            "imageData",
            "hookSize",
            "yarn",
            "notes",
            "currentRound",
            "currentStitch",
            "markerXRatio",
            "markerYRatio",
            "isInWorks",
            "isStarred",
            "stitchImages",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        // Absent dates are omitted rather than written as null
        assert!(!object.contains_key("startDate"));
        assert_eq!(json["imageData"], "/9g=");
        assert_eq!(json["stitchImages"][0], "AQI=");
        let id = json["id"].as_str().unwrap();
        assert_eq!(id, id.to_uppercase());
    }

    #[test]
    fn test_lowercase_ids_are_accepted() {
        let pattern = Pattern::new("Hat", vec![7]);
        let mut json = serde_json::to_value(&pattern).unwrap();
        json["id"] = serde_json::Value::String(pattern.id.to_string());
        let restored: Pattern = serde_json::from_value(json).unwrap();
        assert_eq!(restored.id, pattern.id);
    }

    #[test]
    fn test_legacy_conversion() {
        let mut pattern = Pattern::new("Scarf", vec![9]);
        pattern.current_round = 4;
        let mut json = serde_json::to_value(&pattern).unwrap();
        let object = json.as_object_mut().unwrap();
        object.remove("isInWorks");
        object.remove("isStarred");
        object.remove("stitchImages");
        object.insert("isFinished".into(), true.into());

        let legacy: LegacyPattern = serde_json::from_value(json).unwrap();
        let migrated = Pattern::from(legacy);
        assert!(migrated.is_in_works);
        assert!(!migrated.is_starred);
        assert!(migrated.stitch_images.is_empty());
        assert_eq!(migrated.current_round, 4);
        assert_eq!(migrated.id, pattern.id);
    }

    #[test]
    fn test_workspace_markers_grow_on_demand() {
        let mut state = WorkspaceState::for_images(0);
        assert_eq!(state.markers.len(), 1);
        assert_eq!(state.marker(3), Marker::default());

        state.set_marker(3, 1.5, -0.2);
        assert_eq!(state.markers.len(), 4);
        assert_eq!(state.marker(3), Marker { x: 1.0, y: 0.0 });
        assert_eq!(state.marker(1), Marker::default());
    }

    #[test]
    fn test_workspace_counters_floor_at_zero() {
        let mut state = WorkspaceState::for_images(2);
        state.set_round(-3);
        state.set_stitch(12);
        assert_eq!(state.round, 0);
        assert_eq!(state.stitch, 12);

        state.reset(3);
        assert_eq!(state, WorkspaceState::for_images(3));
    }

    #[test]
    fn test_clamp_ratio() {
        assert_eq!(clamp_ratio(1.5), 1.0);
        assert_eq!(clamp_ratio(-0.1), 0.0);
        assert_eq!(clamp_ratio(0.25), 0.25);
        assert_eq!(clamp_ratio(f64::NAN), 0.5);
    }
}
