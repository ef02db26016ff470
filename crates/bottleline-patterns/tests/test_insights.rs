use bottleline_patterns::*;
use proptest::prelude::*;

fn defect_strategy() -> impl Strategy<Value = DefectType> {
    prop_oneof![
        Just(DefectType::Label),
        Just(DefectType::Dent),
        Just(DefectType::Cap),
        Just(DefectType::Liquid),
    ]
}

#[test]
fn test_dent_progression_reported_at_85() {
    let mut patterns = DefectPatterns::default();
    for slot in [2, 4, 6] {
        patterns.add_occurrence(slot, DefectType::Dent);
    }

    let insights = derive_insights(&patterns, 50);
    let sequential: Vec<&Insight> = insights
        .iter()
        .filter(|i| i.kind == InsightKind::SequentialFault)
        .collect();

    assert_eq!(sequential.len(), 1);
    assert_eq!(sequential[0].defect, Some(DefectType::Dent));
    assert_eq!(sequential[0].confidence, 85.0);
}

#[test]
fn test_quarter_label_rate_hotspot() {
    let mut patterns = DefectPatterns::default();
    for _ in 0..25 {
        patterns.add_occurrence(11, DefectType::Label);
    }

    let insights = derive_insights(&patterns, 100);
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].kind, InsightKind::Hotspot);
    assert_eq!(insights[0].confidence, 55.0);
}

#[test]
fn test_zero_inspected_is_silent() {
    let patterns = DefectPatterns::default();
    assert_eq!(defect_rate(0, 0), 0.0);
    assert!(derive_insights(&patterns, 0).is_empty());
}

#[test]
fn test_recorded_stream_feeds_insights() {
    // every bottle defective with a label, so each slot gets 1/30 of the stream
    let mut patterns = DefectPatterns::default();
    let label = DefectSet::single(DefectType::Label);
    for _ in 0..60 {
        patterns.record(&label);
    }
    let insights = derive_insights(&patterns, 60);

    // no single slot exceeds 20%, but all 30 slots are a unit progression
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].kind, InsightKind::SequentialFault);
    assert_eq!(insights[0].slots.len(), 30);
    assert!(insights[0].pattern.ends_with("0, 1, 2..."));
}

proptest! {
    #[test]
    fn prop_confidence_always_bounded(
        entries in prop::collection::vec((0u32..30, defect_strategy(), 1u64..200), 0..40),
        total in 0u64..500,
    ) {
        let mut patterns = DefectPatterns::default();
        for (slot, defect, count) in entries {
            for _ in 0..count {
                patterns.add_occurrence(slot, defect);
            }
        }
        for insight in derive_insights(&patterns, total) {
            prop_assert!(insight.confidence >= 0.0);
            prop_assert!(insight.confidence <= MAX_CONFIDENCE);
            prop_assert!(!insight.pattern.is_empty());
            prop_assert!(!insight.probable_cause.is_empty());
            prop_assert!(!insight.recommended_action.is_empty());
        }
    }

    #[test]
    fn prop_counts_only_grow(
        sets in prop::collection::vec(prop::collection::vec(defect_strategy(), 0..3), 1..100)
    ) {
        let mut patterns = DefectPatterns::default();
        let mut previous_total = 0u64;
        for tags in sets {
            let record = patterns.record(&DefectSet::from_defects(tags));
            prop_assert!(record.slot < DEFAULT_LINE_LENGTH);
            let total: u64 = patterns.iter().map(|(_, c)| c.total()).sum();
            prop_assert!(total >= previous_total);
            previous_total = total;
        }
    }
}
