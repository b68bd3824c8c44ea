//! Process environment isolation for configuration-loading tests.
//!
//! `AtelierConfig::load` reads `ATELIER_*` variables straight from the
//! process, so each test clears every such variable before applying its own
//! overrides and restores the originals when done.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock};

use atelier::config::ENV_PREFIX;

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Holds the process environment for one test.
///
/// While the guard lives, the only `ATELIER_*` variables set are the
/// overrides it was created with. Dropping it restores what was there.
pub struct AtelierEnv {
    saved: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl AtelierEnv {
    /// Clears every `ATELIER_*` variable, then sets `overrides`.
    pub fn isolated(overrides: &[(&str, &str)]) -> Self {
        let lock = env_lock();
        let inherited: Vec<OsString> = env::vars_os()
            .map(|(key, _)| key)
            .filter(|key| key.to_string_lossy().starts_with(ENV_PREFIX))
            .collect();
        let mut saved = Vec::with_capacity(inherited.len() + overrides.len());

        for key in inherited {
            saved.push((key.clone(), env::var_os(&key)));
            unsafe {
                // SAFETY: ENV_MUTEX is held, so no other config test reads
                // or writes the environment concurrently.
                env::remove_var(&key);
            }
        }
        for (key, value) in overrides {
            if !saved.iter().any(|(name, _)| name == *key) {
                saved.push((OsString::from(*key), None));
            }
            unsafe {
                // SAFETY: ENV_MUTEX is held.
                env::set_var(key, value);
            }
        }

        Self { saved, _lock: lock }
    }
}

impl Drop for AtelierEnv {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            unsafe {
                // SAFETY: the guard still holds ENV_MUTEX until this returns.
                match value {
                    Some(original) => env::set_var(&key, &original),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
