// Distribution building, interval search and cooldown sampling

#[cfg(test)]
mod tests {
    use crate::playlist::{
        CumulativeDistribution, ExhaustionCause, RunParams, SamplingError, WeightedSampler,
        leftmost_greater,
    };
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn distribution(weights: &[f64]) -> CumulativeDistribution {
        CumulativeDistribution::from_weights(
            weights
                .iter()
                .enumerate()
                .map(|(i, w)| (format!("t{i}"), *w))
                .collect(),
        )
        .unwrap()
    }

    fn sampler(dist: &CumulativeDistribution, seed: u64) -> WeightedSampler<'_, StdRng> {
        WeightedSampler::new(dist, StdRng::seed_from_u64(seed))
    }

    /// No id appears again within `cooldown` positions of its last occurrence
    fn cooldown_respected(selection: &[String], cooldown: usize) -> bool {
        selection.iter().enumerate().all(|(i, id)| {
            let start = i.saturating_sub(cooldown);
            !selection[start..i].contains(id)
        })
    }

    #[test]
    fn test_cumulative_is_normalized() {
        let dist = distribution(&[1.0, 3.0, 0.0, 4.0]);
        assert_eq!(dist.len(), 4);
        let expected = [0.125, 0.5, 0.5, 1.0];
        for (actual, expected) in dist.cumulative().iter().zip(expected) {
            assert_relative_eq!(*actual, expected);
        }
        assert_eq!(dist.cumulative()[3], 1.0);
        assert_eq!(dist.selectable_count(), 3);
        assert_relative_eq!(dist.probability(1).unwrap(), 0.375);
        assert!(dist.probability(4).is_none());
    }

    #[test]
    fn test_empty_and_zero_weight_catalogs_fail() {
        assert!(matches!(
            CumulativeDistribution::from_weights(vec![]),
            Err(SamplingError::EmptyCatalog)
        ));
        let zero = vec![
            ("a".to_string(), 0.0),
            ("b".to_string(), 0.0),
            ("c".to_string(), 0.0),
        ];
        assert!(matches!(
            CumulativeDistribution::from_weights(zero),
            Err(SamplingError::ZeroTotalWeight { tracks: 3 })
        ));
    }

    #[test]
    fn test_invalid_weights_are_rejected() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let weighted = vec![("a".to_string(), 1.0), ("b".to_string(), bad)];
            assert!(matches!(
                CumulativeDistribution::from_weights(weighted),
                Err(SamplingError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_overflowing_total_weight_is_rejected() {
        let weighted = vec![
            ("a".to_string(), 1e308),
            ("b".to_string(), 1e308),
            ("c".to_string(), 1.0),
        ];
        assert!(matches!(
            CumulativeDistribution::from_weights(weighted),
            Err(SamplingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let weighted = vec![
            ("a".to_string(), 1.0),
            ("b".to_string(), 1.0),
            ("a".to_string(), 2.0),
        ];
        assert!(matches!(
            CumulativeDistribution::from_weights(weighted),
            Err(SamplingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_leftmost_strictly_greater_tie_break() {
        assert_eq!(leftmost_greater(&[0.2, 0.5, 0.5, 1.0], 0.5), 3);

        // Same shape built from weights: the zero-weight track at index 2 is skipped
        let dist = distribution(&[2.0, 3.0, 0.0, 5.0]);
        assert_eq!(dist.locate(0.5), 3);
    }

    #[test]
    fn test_boundary_draws() {
        let dist = distribution(&[3.0, 7.0]);
        assert_eq!(dist.locate(0.0), 0);
        assert_eq!(dist.locate(0.3), 1);
        assert_eq!(dist.locate(0.299_999), 0);
        assert_eq!(dist.locate(1.0 - f64::EPSILON), 1);
    }

    #[test]
    fn test_zero_weight_tracks_are_never_drawn() {
        let dist = distribution(&[0.0, 1.0, 0.0, 2.0, 0.0]);
        assert_eq!(dist.locate(0.0), 1);
        assert_eq!(dist.locate(dist.cumulative()[1]), 3);

        let mut sampler = sampler(&dist, 11);
        for _ in 0..20_000 {
            let index = sampler.draw_index();
            assert!(index == 1 || index == 3, "drew zero-weight index {index}");
        }
    }

    #[test]
    fn test_draw_frequencies_match_weights() {
        let weights = [1.0, 2.0, 3.0, 4.0, 0.0];
        let dist = distribution(&weights);
        let mut sampler = sampler(&dist, 42);
        let draws = 100_000;

        let mut counts = [0usize; 5];
        for _ in 0..draws {
            counts[sampler.draw_index()] += 1;
        }

        for (index, count) in counts.iter().enumerate() {
            let expected = dist.probability(index).unwrap();
            let observed = *count as f64 / draws as f64;
            assert!(
                (observed - expected).abs() < 0.01,
                "index {index}: observed {observed}, expected {expected}"
            );
        }
        assert_eq!(counts[4], 0);
    }

    #[test]
    fn test_uniform_run_without_cooldown_never_rejects() {
        let dist = distribution(&[1.0; 5]);
        // Exactly one draw per selection is allowed, so any rejection would fail the run
        let run = RunParams::new(5, 0).with_max_attempts(5);
        let selection = sampler(&dist, 3).sample(&run).unwrap();

        assert_eq!(selection.len(), 5);
        assert!(selection.iter().all(|id| dist.ids().contains(id)));
    }

    #[test]
    fn test_full_cooldown_yields_permutation() {
        let dist = distribution(&[1.0; 5]);
        let selection = sampler(&dist, 9).sample(&RunParams::new(5, 4)).unwrap();

        let mut sorted = selection.clone();
        sorted.sort();
        assert_eq!(sorted, dist.ids().to_vec());
    }

    #[test]
    fn test_cooldown_rotates_small_catalog() {
        let dist = distribution(&[1.0, 1.0, 1.0]);
        let selection = sampler(&dist, 5).sample(&RunParams::new(30, 2)).unwrap();

        assert_eq!(selection.len(), 30);
        assert!(cooldown_respected(&selection, 2));
        // With K = n - 1 the order is forced after the first three picks
        for i in 3..selection.len() {
            assert_eq!(selection[i], selection[i - 3]);
        }
    }

    #[test]
    fn test_catalog_smaller_than_window_fails_fast() {
        let dist = distribution(&[1.0, 1.0, 1.0]);
        let err = sampler(&dist, 1)
            .sample(&RunParams::new(10, 5))
            .unwrap_err();

        match err {
            SamplingError::AttemptsExhausted {
                gathered,
                target,
                attempts,
                cause,
                partial,
            } => {
                assert_eq!(gathered, 3);
                assert_eq!(target, 10);
                assert!(attempts < 1000, "should stop before the cap, took {attempts}");
                assert_eq!(
                    cause,
                    ExhaustionCause::CatalogExhausted {
                        selectable: 3,
                        cooldown: 5
                    }
                );
                assert_eq!(partial.iter().collect::<HashSet<_>>().len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_huge_cooldown_reports_exhausted_catalog() {
        let dist = distribution(&[1.0, 1.0, 1.0]);
        let cooldown = usize::MAX / 4;
        let err = sampler(&dist, 6)
            .sample(&RunParams::new(5, cooldown))
            .unwrap_err();

        assert!(matches!(
            err,
            SamplingError::AttemptsExhausted {
                gathered: 3,
                target: 5,
                cause: ExhaustionCause::CatalogExhausted { selectable: 3, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_zero_weights_count_against_selectable_tracks() {
        let dist = distribution(&[0.0, 1.0, 0.0, 1.0, 0.0]);
        let err = sampler(&dist, 2).sample(&RunParams::new(4, 2)).unwrap_err();

        assert!(matches!(
            err,
            SamplingError::AttemptsExhausted {
                gathered: 2,
                cause: ExhaustionCause::CatalogExhausted {
                    selectable: 2,
                    cooldown: 2
                },
                ..
            }
        ));
    }

    #[test]
    fn test_attempt_cap_is_reported() {
        // The second track is practically unreachable, so after one pick every draw collides
        let dist = distribution(&[1.0, 1e-12]);
        let run = RunParams::new(10, 1).with_max_attempts(20);
        let err = sampler(&dist, 8).sample(&run).unwrap_err();

        match err {
            SamplingError::AttemptsExhausted {
                gathered,
                attempts,
                cause,
                partial,
                ..
            } => {
                assert_eq!(cause, ExhaustionCause::AttemptCap);
                assert_eq!(attempts, 20);
                assert!(gathered >= 1 && gathered < 10);
                assert_eq!(partial.len(), gathered);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_into_partial() {
        let dist = distribution(&[1.0, 1.0]);
        let err = sampler(&dist, 4).sample(&RunParams::new(5, 3)).unwrap_err();
        assert_eq!(err.into_partial().map(|p| p.len()), Some(2));
        assert!(SamplingError::EmptyCatalog.into_partial().is_none());
    }

    #[test]
    fn test_invalid_run_parameters() {
        let dist = distribution(&[1.0, 2.0]);
        assert!(matches!(
            sampler(&dist, 0).sample(&RunParams::new(0, 0)),
            Err(SamplingError::InvalidParameter(_))
        ));
        assert!(matches!(
            sampler(&dist, 0).sample(&RunParams::new(10, 0).with_max_attempts(9)),
            Err(SamplingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let dist = distribution(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let run = RunParams::new(40, 2);
        let first = sampler(&dist, 77).sample(&run).unwrap();
        let second = sampler(&dist, 77).sample(&run).unwrap();
        assert_eq!(first, second);
    }

    fn weight_strategy() -> impl Strategy<Value = f64> {
        prop_oneof![1 => Just(0.0), 3 => 0.01f64..100.0]
    }

    proptest! {
        #[test]
        fn cumulative_is_normalized_and_monotone(
            weights in prop::collection::vec(weight_strategy(), 1..50)
        ) {
            prop_assume!(weights.iter().any(|&w| w > 0.0));
            let dist = distribution(&weights);
            let cumulative = dist.cumulative();

            prop_assert_eq!(cumulative.len(), weights.len());
            prop_assert!((cumulative[cumulative.len() - 1] - 1.0).abs() < 1e-12);

            let mut previous = 0.0;
            for (entry, weight) in cumulative.iter().zip(&weights) {
                if *weight > 0.0 {
                    prop_assert!(*entry > previous);
                } else {
                    prop_assert_eq!(*entry, previous);
                }
                previous = *entry;
            }
        }

        #[test]
        fn search_matches_linear_scan(
            values in prop::collection::vec(0.0f64..1.0, 0..40),
            target in 0.0f64..1.0,
        ) {
            let mut values = values;
            values.sort_by(|a, b| a.total_cmp(b));
            let expected = values.iter().position(|&v| v > target).unwrap_or(values.len());
            prop_assert_eq!(leftmost_greater(&values, target), expected);
        }

        #[test]
        fn sampling_respects_cooldown(
            weights in prop::collection::vec(prop_oneof![1 => Just(0.0), 3 => 1.0f64..10.0], 1..25),
            cooldown in 0usize..8,
            target in 1usize..60,
            seed in any::<u64>(),
        ) {
            prop_assume!(weights.iter().any(|&w| w > 0.0));
            let dist = distribution(&weights);
            let selectable = dist.selectable_count();
            let doomed = cooldown > 0 && selectable <= cooldown && target > selectable;

            match sampler(&dist, seed).sample(&RunParams::new(target, cooldown)) {
                Ok(selection) => {
                    prop_assert!(!doomed);
                    prop_assert_eq!(selection.len(), target);
                    prop_assert!(cooldown_respected(&selection, cooldown));
                    for id in &selection {
                        let index = dist.ids().iter().position(|i| i == id).unwrap();
                        prop_assert!(weights[index] > 0.0);
                    }
                }
                Err(SamplingError::AttemptsExhausted { gathered, cause, partial, .. }) => {
                    prop_assert_eq!(gathered, partial.len());
                    prop_assert!(cooldown_respected(&partial, cooldown));
                    match cause {
                        ExhaustionCause::CatalogExhausted { .. } => prop_assert!(doomed),
                        ExhaustionCause::AttemptCap => prop_assert!(!doomed),
                    }
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
