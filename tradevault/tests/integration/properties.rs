//! Property-based tests using proptest

use std::collections::BTreeSet;
use std::time::Duration;

use proptest::prelude::*;
use tradevault::grant::{retry_with_delay, RetryOutcome, RetryPolicy};
use tradevault::mocks::{MemoryStore, MockTime};
use tradevault::result::{classify, format_percent, select_entry, ResultBundle};
use tradevault::{reconcile_listings, HiddenSet, Listing, VaultError};

fn listing(address: &str, title: &str) -> Listing {
    Listing::builder_with_time(MockTime::new(1))
        .protected_address(address)
        .title(title)
        .owner("0xseller")
        .build()
        .unwrap()
}

fn listings_from(keys: &[(u8, u8)]) -> Vec<Listing> {
    keys.iter()
        .map(|(addr, title)| listing(&format!("0x{addr:02X}"), &format!("t{title}")))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_reconcile_is_idempotent_and_hides(
        fresh in prop::collection::vec((0u8..16, any::<u8>()), 0..12),
        prior in prop::collection::vec((0u8..16, any::<u8>()), 0..12),
        hidden in prop::collection::btree_set(0u8..16, 0..4),
    ) {
        let hidden: BTreeSet<String> = hidden.iter().map(|h| format!("0x{h:02x}")).collect();
        let fresh = listings_from(&fresh);
        let prior = listings_from(&prior);

        let once = reconcile_listings(fresh.clone(), &prior, &hidden);
        let twice = reconcile_listings(fresh, &once, &hidden);
        prop_assert_eq!(&once, &twice);

        let keys: Vec<String> = once.iter().map(Listing::key).collect();
        let unique: BTreeSet<&String> = keys.iter().collect();
        prop_assert_eq!(unique.len(), keys.len());
        prop_assert!(keys.iter().all(|k| !hidden.contains(k)));
    }

    #[test]
    fn test_format_percent_has_at_most_two_decimals(value in -1.0e6f64..1.0e6) {
        let rendered = format_percent(value).unwrap();
        if let Some((_, decimals)) = rendered.split_once('.') {
            prop_assert!(!decimals.is_empty() && decimals.len() <= 2);
            prop_assert!(!decimals.ends_with('0'));
        }
        let parsed: f64 = rendered.parse().unwrap();
        prop_assert!((parsed - value).abs() <= 0.005 + f64::EPSILON * value.abs());
    }

    #[test]
    fn test_hidden_set_only_grows(ids in prop::collection::vec("0x[0-9a-fA-F]{1,8}", 1..10)) {
        let hidden = HiddenSet::new(MemoryStore::new());
        let mut previous = 0;
        for id in &ids {
            hidden.insert(id).unwrap();
            let current = hidden.load();
            prop_assert!(current.len() >= previous);
            prop_assert!(hidden.contains(id));
            previous = current.len();
        }
        prop_assert!(ids.iter().all(|id| hidden.contains(id)));
    }

    #[test]
    fn test_plain_bytes_classify_deterministically(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let bundle = ResultBundle {
            bytes: bytes.clone(),
            container: Some(false),
            path_hint: None,
        };
        let first = classify(&bundle).unwrap();
        let second = classify(&bundle).unwrap();
        prop_assert_eq!(first.kind, second.kind);
        prop_assert_eq!(&first.filename, &second.filename);
        prop_assert_eq!(&first.bytes, &bytes);
    }

    #[test]
    fn test_exact_path_wins_over_filename_match(
        dirs in prop::collection::vec("[a-z]{1,6}", 1..5),
        pick in any::<prop::sample::Index>(),
    ) {
        let entries: Vec<(String, bool)> = dirs
            .iter()
            .map(|d| (format!("{d}/result.json"), false))
            .collect();
        let wanted = pick.index(entries.len());
        let hint = format!("/{}", entries[wanted].0);

        let selected = select_entry(&entries, Some(&hint)).unwrap();
        prop_assert_eq!(&entries[selected].0, &entries[wanted].0);
    }

    #[test]
    fn test_retry_attempts_and_delays(max_attempts in 1u32..6, succeed_at in 1u32..8) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let time = MockTime::new(0);
        let policy = RetryPolicy::new(max_attempts, Duration::from_millis(4000));

        let outcome: RetryOutcome<u32> = runtime.block_on(retry_with_delay(
            policy,
            &time,
            |attempt| async move {
                if attempt >= succeed_at {
                    Ok(attempt)
                } else {
                    Err(VaultError::Grant("not indexed".to_string()))
                }
            },
            |_, _, _| {},
        ));

        let expected_attempts = succeed_at.min(max_attempts);
        prop_assert_eq!(outcome.attempts(), expected_attempts);
        prop_assert_eq!(outcome.is_success(), succeed_at <= max_attempts);
        prop_assert_eq!(time.sleeps().len() as u32, expected_attempts - 1);
    }
}
