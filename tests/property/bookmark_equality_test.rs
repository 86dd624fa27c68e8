//! Property-based tests for Bookmark identity.
//!
//! These tests verify that equality and hashing follow the URL alone, that
//! `identical` additionally requires the title, and that the derived cache
//! keys are usable as file names.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use acme::types::bookmark::Bookmark;
use proptest::prelude::*;
use url::Url;

fn arb_url() -> impl Strategy<Value = Url> {
    ("[a-z]{1,12}", prop::sample::select(vec!["com", "org", "dev"]), "[a-z0-9/]{0,20}")
        .prop_map(|(host, tld, path)| {
            Url::parse(&format!("https://{}.{}/{}", host, tld, path)).unwrap()
        })
}

fn arb_title() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ]{0,30}"
}

fn hash_of(b: &Bookmark) -> u64 {
    let mut hasher = DefaultHasher::new();
    b.hash(&mut hasher);
    hasher.finish()
}

// **Property 1: Equality ignores title**
//
// *For any* URL and any two titles, the two bookmarks are equal and hash the
// same; they are `identical` only when the titles match.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn equality_is_by_url(url in arb_url(), t1 in arb_title(), t2 in arb_title()) {
        let a = Bookmark::new(url.clone(), t1.clone());
        let b = Bookmark::new(url, t2.clone());

        prop_assert_eq!(&a, &b);
        prop_assert!(a.same_entity(&b));
        prop_assert_eq!(hash_of(&a), hash_of(&b));
        prop_assert_eq!(a.identical(&b), t1 == t2);
    }
}

// **Property 2: Different URLs are different entities**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn different_urls_differ(u1 in arb_url(), u2 in arb_url(), title in arb_title()) {
        prop_assume!(u1 != u2);
        let a = Bookmark::new(u1, title.clone());
        let b = Bookmark::new(u2, title);
        prop_assert_ne!(&a, &b);
        prop_assert!(!a.identical(&b));
    }
}

// **Property 3: Favicon keys contain no path separators**
//
// *For any* URL, the favicon key starts with `favicon-` and has no `/`, so it
// names a single file in the cache directory.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn favicon_key_is_flat(url in arb_url(), title in arb_title()) {
        let key = Bookmark::new(url, title).favicon_key();
        prop_assert!(key.starts_with("favicon-"));
        prop_assert!(!key.contains('/'));
    }
}
