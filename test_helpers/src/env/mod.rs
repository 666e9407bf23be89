//! Serialised mutation of process environment variables in tests.
//!
//! Configuration is layered from `INJECTCONF_*` variables and templates read
//! `env.*` references, so tests touching either share process-wide state.
//! Every mutation takes a global re-entrant lock and returns a guard that
//! restores the prior value on drop (removing the variable when it was
//! previously unset). Guards for one key restore in LIFO order.
//!
//! # Examples
//!
//! ```
//! use injectconf_test_helpers::env;
//!
//! let _g = env::set_var("INJECTCONF_CONFLICT_POLICY", "error");
//! // The override lasts until `_g` is dropped.
//! ```

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::LazyLock;

static ENV_MUTEX: LazyLock<ReentrantMutex<()>> = LazyLock::new(ReentrantMutex::default);

/// Wrapper around `std::env::set_var`.
///
/// # Safety
///
/// Callers must hold `ENV_MUTEX`.
unsafe fn env_set_var(key: &str, value: &OsStr) {
    unsafe { env::set_var(key, value) };
}

/// Wrapper around `std::env::remove_var`.
///
/// # Safety
///
/// Callers must hold `ENV_MUTEX`.
unsafe fn env_remove_var(key: &str) {
    unsafe { env::remove_var(key) };
}

fn mutate_locked<F>(key: String, mutator: F, _guard: &ReentrantMutexGuard<'static, ()>) -> EnvVarGuard
where
    F: FnOnce(&str),
{
    let original = env::var_os(&key);
    mutator(&key);
    EnvVarGuard { key, original }
}

/// RAII guard restoring an environment variable to its prior value on drop.
#[must_use = "dropping restores the prior value"]
pub struct EnvVarGuard {
    key: String,
    original: Option<OsString>,
}

impl fmt::Debug for EnvVarGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvVarGuard")
            .field("key", &self.key)
            .field("had_original", &self.original.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        let _guard = ENV_MUTEX.lock();
        if let Some(val) = self.original.take() {
            // SAFETY: `ENV_MUTEX` is held.
            unsafe { env_set_var(&self.key, &val) };
        } else {
            // SAFETY: `ENV_MUTEX` is held.
            unsafe { env_remove_var(&self.key) };
        }
    }
}

/// Exclusive access to the environment for the guard's lifetime.
#[must_use = "dropping releases the environment lock"]
pub struct EnvVarLock {
    guard: ReentrantMutexGuard<'static, ()>,
}

impl EnvVarLock {
    /// Sets a variable while holding the lock.
    pub fn set_var<K, V>(&self, key: K, value: V) -> EnvVarGuard
    where
        K: Into<String>,
        V: AsRef<OsStr>,
    {
        // SAFETY: the lock is held for the duration of the call.
        mutate_locked(key.into(), |k| unsafe { env_set_var(k, value.as_ref()) }, &self.guard)
    }

    /// Removes a variable while holding the lock.
    pub fn remove_var<K>(&self, key: K) -> EnvVarGuard
    where
        K: Into<String>,
    {
        // SAFETY: the lock is held for the duration of the call.
        mutate_locked(key.into(), |k| unsafe { env_remove_var(k) }, &self.guard)
    }

    /// Removes every variable whose name starts with `prefix`.
    pub fn clear_prefixed(&self, prefix: &str) -> Vec<EnvVarGuard> {
        let keys: Vec<String> = env::vars_os()
            .filter_map(|(key, _)| key.into_string().ok())
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.into_iter().map(|key| self.remove_var(key)).collect()
    }
}

/// Holds the lock and a set of guards; guards restore before the lock is
/// released.
#[must_use = "dropping releases the environment lock and restores guards"]
pub struct EnvScope {
    guards: Vec<EnvVarGuard>,
    _lock: EnvVarLock,
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        drop(std::mem::take(&mut self.guards));
    }
}

/// Sets a variable and returns a guard restoring its prior value.
///
/// # Examples
/// ```
/// use injectconf_test_helpers::env;
/// let _g = env::set_var("STAGE", "qa");
/// assert!(matches!(std::env::var("STAGE"), Ok(ref value) if value == "qa"));
/// ```
pub fn set_var<K, V>(key: K, value: V) -> EnvVarGuard
where
    K: Into<String>,
    V: AsRef<OsStr>,
{
    lock().set_var(key, value)
}

/// Removes a variable and returns a guard restoring its prior value.
///
/// # Examples
/// ```
/// use injectconf_test_helpers::env;
/// let _g = env::remove_var("STAGE");
/// assert!(std::env::var("STAGE").is_err());
/// ```
pub fn remove_var<K>(key: K) -> EnvVarGuard
where
    K: Into<String>,
{
    lock().remove_var(key)
}

/// Acquires the global environment lock.
pub fn lock() -> EnvVarLock {
    EnvVarLock {
        guard: ENV_MUTEX.lock(),
    }
}

/// Runs `builder` under the lock and keeps the lock, plus the guards it
/// returned, until the scope is dropped.
///
/// # Examples
/// ```
/// use injectconf_test_helpers::env;
///
/// let _scope = env::scope_with(|lock| {
///     let mut guards = lock.clear_prefixed("INJECTCONF_");
///     guards.push(lock.set_var("INJECTCONF_SOURCES", "[env]"));
///     guards
/// });
/// ```
pub fn scope_with<F>(builder: F) -> EnvScope
where
    F: FnOnce(&EnvVarLock) -> Vec<EnvVarGuard>,
{
    let lock = lock();
    let guards = builder(&lock);
    EnvScope {
        guards,
        _lock: lock,
    }
}

#[cfg(test)]
mod tests;
