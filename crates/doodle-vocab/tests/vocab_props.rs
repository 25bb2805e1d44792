use doodle_vocab::{filter_labels, BannedLabels, Label, TargetQueue};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn label_strategy() -> impl Strategy<Value = Label> {
    prop_oneof![
        Just("cat"),
        Just("dog"),
        Just("bat"),
        Just("van"),
        Just("sun"),
        Just("tree"),
        Just("arm"),
        Just("house"),
    ]
    .prop_map(Label::from)
}

proptest! {
    #[test]
    fn prop_filter_excludes_banned_and_keeps_order(
        vocab in prop::collection::vec(label_strategy(), 0..32),
        banned in prop::collection::vec(label_strategy(), 0..4),
    ) {
        let banned = BannedLabels::new(banned);
        let filtered = filter_labels(&vocab, &banned);

        prop_assert!(filtered.iter().all(|l| !banned.contains(l.as_str())));

        // Subsequence of the input
        let mut it = vocab.iter();
        for label in &filtered {
            prop_assert!(it.any(|v| v == label));
        }
    }

    #[test]
    fn prop_queue_is_permutation_of_playable_labels(
        vocab in prop::collection::vec(label_strategy(), 0..32),
        seed in any::<u64>(),
    ) {
        let banned = BannedLabels::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let queue = TargetQueue::build(&vocab, &banned, &mut rng);

        let mut expected: Vec<Label> = filter_labels(&vocab, &banned);
        expected.sort();
        expected.dedup();

        let mut actual = queue.targets().to_vec();
        actual.sort();

        prop_assert_eq!(actual, expected);
        prop_assert_eq!(queue.cursor(), 0);
    }

    #[test]
    fn prop_cursor_is_monotonic(steps in 0usize..20) {
        let vocab: Vec<Label> = ["cat", "dog", "sun"].into_iter().map(Label::from).collect();
        let mut queue = TargetQueue::build(&vocab, &BannedLabels::none(), &mut StdRng::seed_from_u64(0));
        let mut last = queue.cursor();
        for _ in 0..steps {
            queue.advance();
            prop_assert!(queue.cursor() > last);
            last = queue.cursor();
        }
        prop_assert_eq!(queue.is_exhausted(), steps >= 3);
    }
}
