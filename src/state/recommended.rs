/// Built-in recommended patterns
///
/// These have no pattern record; their progress lives only in the workspace
/// state map under their fixed id.

use crate::hook::{self, HookSize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendedPattern {
    /// Fixed workspace state key
    pub id: &'static str,
    pub name: &'static str,
    pub hook_mm: f64,
    pub yarn: &'static str,
    /// Bundled stitch diagrams shown after the main image
    pub stitch_image_count: usize,
}

impl RecommendedPattern {
    pub fn image_count(&self) -> usize {
        1 + self.stitch_image_count
    }

    /// Table entry for the listed millimeter size, giving the hook number
    pub fn hook(&self) -> HookSize {
        HookSize::at(hook::closest_index(self.hook_mm))
    }
}

pub static RECOMMENDED: [RecommendedPattern; 4] = [
    RecommendedPattern {
        id: "recommended.A",
        name: "Pattern A",
        hook_mm: 2.5,
        yarn: "Color：01/24/26",
        stitch_image_count: 1,
    },
    RecommendedPattern {
        id: "recommended.B",
        name: "Pattern B",
        hook_mm: 2.0,
        yarn: "Color：01/01/10/09/11",
        stitch_image_count: 1,
    },
    RecommendedPattern {
        id: "recommended.C",
        name: "Pattern C",
        hook_mm: 2.0,
        yarn: "Color：01/02/15/05/09",
        stitch_image_count: 1,
    },
    RecommendedPattern {
        id: "recommended.D",
        name: "Pattern D",
        hook_mm: 2.0,
        yarn: "Color：01/16/15/10",
        stitch_image_count: 1,
    },
];

pub fn find(id: &str) -> Option<&'static RecommendedPattern> {
    RECOMMENDED.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_findable() {
        for entry in &RECOMMENDED {
            assert_eq!(find(entry.id), Some(entry));
        }
        assert!(find("recommended.Z").is_none());
    }

    #[test]
    fn test_hook_number_comes_from_the_table() {
        let a = find("recommended.A").unwrap().hook();
        assert_eq!((a.mm, a.number_label()), (2.5, "4".to_string()));
        let b = find("recommended.B").unwrap().hook();
        assert_eq!((b.mm, b.number_label()), (2.0, "2".to_string()));
    }
}
