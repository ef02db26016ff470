//! Shape classification for the slots a defect type occupies

/// Minimum number of slots before a sequence is considered a pattern
pub const MIN_SEQUENCE_LEN: usize = 3;

/// Layout of ascending slots that qualify as a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceShape {
    /// Every neighbour is exactly one slot apart
    pub consecutive: bool,
    /// Common successive difference, when there is one
    pub step: Option<u32>,
}

impl SequenceShape {
    pub fn is_progression(&self) -> bool {
        self.step.is_some()
    }
}

/// Classify ascending, de-duplicated slots.
///
/// Returns `None` for fewer than [`MIN_SEQUENCE_LEN`] slots, or when the slots
/// are neither consecutive nor evenly spaced.
pub fn classify(sorted_slots: &[u32]) -> Option<SequenceShape> {
    if sorted_slots.len() < MIN_SEQUENCE_LEN {
        return None;
    }

    let diffs: Vec<u32> = sorted_slots
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]))
        .collect();
    let consecutive = diffs.iter().all(|&d| d == 1);
    let step = Some(diffs[0]).filter(|&s| s > 0 && diffs.iter().all(|&d| d == s));

    if consecutive || step.is_some() {
        Some(SequenceShape { consecutive, step })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consecutive_is_unit_progression() {
        let shape = classify(&[4, 5, 6]).unwrap();
        assert!(shape.consecutive);
        assert_eq!(shape.step, Some(1));
    }

    #[test]
    fn test_even_spacing() {
        let shape = classify(&[2, 4, 6]).unwrap();
        assert!(!shape.consecutive);
        assert_eq!(shape.step, Some(2));
        assert_eq!(classify(&[0, 10, 20]).unwrap().step, Some(10));
    }

    #[test]
    fn test_slots_split_across_line_end_are_not_a_sequence() {
        assert_eq!(classify(&[0, 28, 29]), None);
        assert_eq!(classify(&[0, 1, 28, 29]), None);
    }

    #[test]
    fn test_irregular_and_short() {
        assert_eq!(classify(&[1, 2, 5]), None);
        assert_eq!(classify(&[3, 7]), None);
        assert_eq!(classify(&[]), None);
    }
}
