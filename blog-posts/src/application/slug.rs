use std::collections::HashSet;

/// Highest numeric suffix tried before giving up on a unique slug.
pub const MAX_SLUG_SUFFIX: u32 = 99;

pub fn base_slug(title: &str) -> String {
    slug::slugify(title)
}

/// First of `base`, `base2` … `base99` that is not in `taken`. `None` once
/// every candidate is in use.
pub fn resolve_slug(base: &str, taken: &HashSet<String>) -> Option<String> {
    if !taken.contains(base) {
        return Some(base.to_string());
    }

    (2..=MAX_SLUG_SUFFIX)
        .map(|suffix| format!("{base}{suffix}"))
        .find(|candidate| !taken.contains(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn taken(slugs: &[&str]) -> HashSet<String> {
        slugs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn base_slug_is_url_safe() {
        assert_eq!(base_slug("Hello, World! Rust 2024"), "hello-world-rust-2024");
    }

    #[test]
    fn free_base_is_returned_unchanged() {
        assert_eq!(
            resolve_slug("hello", &taken(&["hello-world"])),
            Some("hello".to_string())
        );
    }

    #[test]
    fn collision_appends_first_free_suffix() {
        assert_eq!(
            resolve_slug("hello", &taken(&["hello", "hello2", "hello4"])),
            Some("hello3".to_string())
        );
    }

    #[test]
    fn exhausted_suffixes() {
        let mut slugs: HashSet<String> = (2..=MAX_SLUG_SUFFIX).map(|i| format!("post{i}")).collect();
        slugs.insert("post".into());

        assert_eq!(resolve_slug("post", &slugs), None);
    }

    proptest! {
        #[test]
        fn resolved_slug_is_never_taken(used in proptest::collection::hash_set(1u32..=MAX_SLUG_SUFFIX, 0..60)) {
            let slugs: HashSet<String> = used
                .iter()
                .map(|&i| if i == 1 { "item".to_string() } else { format!("item{i}") })
                .collect();

            let resolved = resolve_slug("item", &slugs);

            prop_assert!(resolved.is_some());
            prop_assert!(!slugs.contains(resolved.as_deref().unwrap_or_default()));
        }
    }
}
