//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key determinism, codec round-trips and TTL decisions.

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cache::{Encoding, KeyDeriver, ManualClock, MemoCache};
use crate::config::Config;
use crate::error::CacheError;
use crate::store::MemoryBackend;

// == Strategies ==
/// Generates computation identities
fn identity_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,31}".prop_map(|s| s)
}

/// Generates mixed positional arguments
fn args_strategy() -> impl Strategy<Value = (i64, String, Option<bool>, Vec<u8>)> {
    (
        any::<i64>(),
        "[ -~]{0,32}",
        any::<Option<bool>>(),
        prop::collection::vec(any::<u8>(), 0..32),
    )
}

/// Generates nested result values
fn value_strategy() -> impl Strategy<Value = BTreeMap<String, Vec<Option<i32>>>> {
    prop::collection::btree_map(
        "[a-z]{1,8}",
        prop::collection::vec(any::<Option<i32>>(), 0..8),
        0..8,
    )
}

fn encoding_strategy() -> impl Strategy<Value = Encoding> {
    prop_oneof![Just(Encoding::Structural), Just(Encoding::Textual)]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Repeated derivation for the same identity and arguments yields the same key.
    #[test]
    fn prop_key_derivation_is_deterministic(
        encoding in encoding_strategy(),
        identity in identity_strategy(),
        args in args_strategy(),
    ) {
        let keys = KeyDeriver::new(encoding);
        let first = keys.derive(&identity, &args).unwrap();
        let second = KeyDeriver::new(encoding).derive(&identity, &args.clone()).unwrap();
        prop_assert_eq!(first, second);
    }

    // Different arguments never share a key.
    #[test]
    fn prop_distinct_arguments_distinct_keys(
        encoding in encoding_strategy(),
        identity in identity_strategy(),
        a in args_strategy(),
        b in args_strategy(),
    ) {
        prop_assume!(a != b);
        let keys = KeyDeriver::new(encoding);
        prop_assert_ne!(keys.derive(&identity, &a).unwrap(), keys.derive(&identity, &b).unwrap());
    }

    // Structural keys never carry control characters, whatever bytes went in.
    #[test]
    fn prop_structural_keys_are_printable(
        identity in identity_strategy(),
        args in args_strategy(),
    ) {
        let key = KeyDeriver::new(Encoding::Structural).derive(&identity, &args).unwrap();
        prop_assert!(key.chars().all(|c| c.is_ascii_graphic()));
    }

    // decode(encode(v)) == v for nested values under both codecs.
    #[test]
    fn prop_codec_roundtrip(encoding in encoding_strategy(), value in value_strategy()) {
        let payload = encoding.encode(&value).unwrap();
        let decoded: BTreeMap<String, Vec<Option<i32>>> = encoding.decode(&payload).unwrap();
        prop_assert_eq!(decoded, value);
    }

    // A call `elapsed` seconds after caching recomputes exactly when elapsed >= ttl.
    #[test]
    fn prop_expiry_decides_recomputation(
        ttl in 1u64..10_000,
        elapsed in 0i64..20_000,
        value in value_strategy(),
    ) {
        let rt = runtime();
        let (first, second, calls) = rt.block_on(async {
            let clock = Arc::new(ManualClock::new(1_000));
            let cache = MemoCache::connect_with_clock(
                Arc::new(MemoryBackend::new()),
                &Config::new("props"),
                clock.clone(),
            )
            .await
            .unwrap();
            let calls = AtomicUsize::new(0);

            let compute = || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CacheError>(value.clone())
            };
            let first = cache.get_or_compute("report", &ttl, ttl, compute).await.unwrap();
            clock.advance(elapsed);
            let second = cache.get_or_compute("report", &ttl, ttl, compute).await.unwrap();
            (first, second, calls.load(Ordering::SeqCst))
        });

        prop_assert_eq!(&first, &value);
        prop_assert_eq!(&second, &value);
        let expected_calls = if elapsed >= ttl as i64 { 2 } else { 1 };
        prop_assert_eq!(calls, expected_calls);
    }
}
