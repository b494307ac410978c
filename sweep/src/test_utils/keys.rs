/// Generates `count` keys that sort in generation order, e.g. `key-00000`.
pub fn generate_keys(count: usize) -> Vec<String> {
    generate_prefixed_keys("key-", count)
}

/// Generates `count` keys starting with `prefix` that sort in generation order.
pub fn generate_prefixed_keys(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|index| format!("{prefix}{index:05}")).collect()
}
