use chrono::{DateTime, SubsecRound, Utc};

use super::data::Pattern;
use super::error::ValidationError;
use crate::hook::{self, HookSize, DEFAULT_HOOK_INDEX};

/// The add-pattern form, before it becomes a pattern
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDraft {
    pub name: String,
    pub image_data: Option<Vec<u8>>,
    pub hook_index: usize,
    pub yarn: String,
    pub notes: String,
    pub is_in_works: bool,
    pub is_starred: bool,
    pub start_date: DateTime<Utc>,
    pub stitch_images: Vec<Vec<u8>>,
}

impl Default for PatternDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            image_data: None,
            hook_index: DEFAULT_HOOK_INDEX,
            yarn: String::new(),
            notes: String::new(),
            is_in_works: false,
            is_starred: false,
            // Stored dates carry microsecond precision
            start_date: Utc::now().trunc_subsecs(6),
            stitch_images: Vec::new(),
        }
    }
}

impl PatternDraft {
    pub fn hook(&self) -> HookSize {
        HookSize::at(self.hook_index)
    }

    pub fn set_hook_index(&mut self, index: usize) {
        self.hook_index = hook::clamp_index(index);
    }

    /// Append loaded stitch images after the ones already picked
    pub fn append_stitch_images(&mut self, images: Vec<Vec<u8>>) {
        self.stitch_images.extend(images);
    }

    /// Check the required fields and build a fresh pattern.
    ///
    /// The name must contain something other than whitespace and a primary
    /// image must be present.
    pub fn to_pattern(&self) -> Result<Pattern, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        let Some(image_data) = &self.image_data else {
            return Err(ValidationError::MissingImage);
        };
        if image_data.is_empty() {
            return Err(ValidationError::MissingImage);
        }

        let mut pattern = Pattern::new(self.name.clone(), image_data.clone());
        pattern.hook_size = self.hook().mm;
        pattern.yarn = self.yarn.clone();
        pattern.notes = self.notes.clone();
        pattern.is_in_works = self.is_in_works;
        pattern.is_starred = self.is_starred;
        pattern.start_date = Some(self.start_date);
        pattern.stitch_images = self.stitch_images.clone();
        Ok(pattern)
    }

    /// Clear the form after a successful save
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> PatternDraft {
        PatternDraft {
            name: "Market bag".into(),
            image_data: Some(vec![1, 2, 3]),
            hook_index: 6,
            yarn: "cotton 8/4".into(),
            notes: "chain 60".into(),
            is_in_works: true,
            is_starred: true,
            stitch_images: vec![vec![4]],
            ..PatternDraft::default()
        }
    }

    #[test]
    fn test_default_hook_is_three_mm() {
        let draft = PatternDraft::default();
        assert_eq!(draft.hook(), HookSize { mm: 3.0, number: 5.0 });
    }

    #[test]
    fn test_to_pattern_copies_form_fields() {
        let draft = filled();
        let pattern = draft.to_pattern().unwrap();
        assert_eq!(pattern.name, "Market bag");
        assert_eq!(pattern.hook_size, 4.5);
        assert_eq!(pattern.yarn, "cotton 8/4");
        assert!(pattern.is_in_works);
        assert!(pattern.is_starred);
        assert_eq!(pattern.start_date, Some(draft.start_date));
        assert_eq!(pattern.stitch_images, vec![vec![4]]);
        assert_eq!(pattern.current_round, 0);
        assert_eq!(pattern.marker_x_ratio, 0.5);
    }

    #[test]
    fn test_each_draft_gets_a_new_id() {
        let draft = filled();
        assert_ne!(draft.to_pattern().unwrap().id, draft.to_pattern().unwrap().id);
    }

    #[test]
    fn test_validation() {
        let mut draft = filled();
        draft.name = " \n".into();
        assert_eq!(draft.to_pattern(), Err(ValidationError::MissingName));

        let mut draft = filled();
        draft.image_data = None;
        assert_eq!(draft.to_pattern(), Err(ValidationError::MissingImage));

        draft.image_data = Some(Vec::new());
        assert_eq!(draft.to_pattern(), Err(ValidationError::MissingImage));
    }

    #[test]
    fn test_hook_selection_and_reset() {
        let mut draft = filled();
        draft.set_hook_index(7);
        assert_eq!(draft.hook().mm, 5.0);
        draft.set_hook_index(42);
        assert_eq!(draft.hook().mm, 6.0);

        draft.append_stitch_images(vec![vec![5], vec![6]]);
        assert_eq!(draft.stitch_images.len(), 3);

        draft.reset();
        assert_eq!(draft.hook_index, DEFAULT_HOOK_INDEX);
        assert!(draft.name.is_empty());
        assert!(draft.image_data.is_none());
        assert!(draft.stitch_images.is_empty());
    }
}
