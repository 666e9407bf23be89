//! Unit tests for environment helpers.

use super::*;

fn value(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[test]
fn guards_restore_prior_values_in_lifo_order() {
    let key = "INJECTCONF_TEST_HELPERS_LIFO";
    let _lock = lock();
    let outer = set_var(key, "outer");
    let inner = set_var(key, "inner");
    assert_eq!(value(key).as_deref(), Some("inner"));
    drop(inner);
    assert_eq!(value(key).as_deref(), Some("outer"));
    drop(outer);
    assert_eq!(value(key), None);
}

#[test]
fn remove_var_restores_the_removed_value() {
    let key = "INJECTCONF_TEST_HELPERS_REMOVE";
    let _lock = lock();
    let set = set_var(key, "kept");
    let removed = remove_var(key);
    assert_eq!(value(key), None);
    drop(removed);
    assert_eq!(value(key).as_deref(), Some("kept"));
    drop(set);
}

#[test]
fn scopes_clear_prefixed_variables_until_dropped() {
    let key = "INJECTCONF_TEST_HELPERS_SCOPE_A";
    let outer = set_var(key, "a");
    {
        let _scope = scope_with(|lock| lock.clear_prefixed("INJECTCONF_TEST_HELPERS_SCOPE_"));
        assert_eq!(value(key), None);
    }
    assert_eq!(value(key).as_deref(), Some("a"));
    drop(outer);
}
