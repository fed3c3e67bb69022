/// Crochet hook sizes
///
/// Hook sizes are always chosen as a (millimeter, number) pair from a fixed
/// table, so the two values can never disagree.

/// Ordered (millimeters, hook number) pairs
pub const HOOK_PAIRS: [(f64, f64); 10] = [
    (2.0, 2.0),
    (2.3, 3.0),
    (2.5, 4.0),
    (3.0, 5.0),
    (3.5, 6.0),
    (4.0, 7.0),
    (4.5, 7.5),
    (5.0, 8.0),
    (5.5, 9.0),
    (6.0, 10.0),
];

/// Index selected for a new pattern (3.0 mm, No. 5)
pub const DEFAULT_HOOK_INDEX: usize = 3;

/// One entry of the hook table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HookSize {
    pub mm: f64,
    pub number: f64,
}

impl HookSize {
    /// Pair at `index`, clamped into the table
    pub fn at(index: usize) -> Self {
        let (mm, number) = HOOK_PAIRS[clamp_index(index)];
        Self { mm, number }
    }

    /// "3.0 mm"
    pub fn mm_label(&self) -> String {
        format!("{:.1} mm", self.mm)
    }

    /// Hook number as printed on the hook: "7.5" for the half size, else an integer
    pub fn number_label(&self) -> String {
        if self.number.fract() == 0.0 {
            format!("{}", self.number as i64)
        } else {
            format!("{}", self.number)
        }
    }
}

pub fn clamp_index(index: usize) -> usize {
    index.min(HOOK_PAIRS.len() - 1)
}

/// Index whose millimeter value is closest to `mm`; the first one wins on ties
pub fn closest_index(mm: f64) -> usize {
    let mut best_index = 0;
    let mut best_diff = f64::MAX;
    for (i, (pair_mm, _)) in HOOK_PAIRS.iter().enumerate() {
        let diff = (pair_mm - mm).abs();
        if diff < best_diff {
            best_diff = diff;
            best_index = i;
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_are_selected_together() {
        assert_eq!(HookSize::at(DEFAULT_HOOK_INDEX), HookSize { mm: 3.0, number: 5.0 });
        assert_eq!(HookSize::at(6), HookSize { mm: 4.5, number: 7.5 });
        assert_eq!(HookSize::at(99), HookSize { mm: 6.0, number: 10.0 });
    }

    #[test]
    fn test_closest_index() {
        assert_eq!(closest_index(3.0), 3);
        assert_eq!(closest_index(2.2), 1);
        assert_eq!(closest_index(0.0), 0);
        assert_eq!(closest_index(12.0), 9);
        // Halfway between 5.0 and 5.5: the earlier entry wins
        assert_eq!(closest_index(5.25), 7);
    }

    #[test]
    fn test_labels() {
        assert_eq!(HookSize::at(6).number_label(), "7.5");
        assert_eq!(HookSize::at(9).number_label(), "10");
        assert_eq!(HookSize::at(1).mm_label(), "2.3 mm");
    }
}
