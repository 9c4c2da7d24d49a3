//! Key/value annotations rendered into every log line.
//!
//! A [`LogContext`] has two scopes. The global scope is shared by all threads
//! and guarded by a `parking_lot::RwLock`. The thread-local scope lives in
//! `thread_local!` storage keyed by the context's id, so independent contexts
//! never see each other's per-thread values.
//!
//! Rendering merges both scopes, thread-local values shadowing global ones
//! with the same key, and produces `[[k1=v1,k2=v2]]` sorted by key, or an
//! empty string when both scopes are empty.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use thiserror::Error;

type Scope = BTreeMap<String, String>;

static NEXT_CONTEXT_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static THREAD_SCOPES: RefCell<HashMap<usize, Scope>> = RefCell::new(HashMap::new());
}

/// Errors raised by context mutators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A key was empty or contained a character reserved by the rendering.
    #[error("invalid context key {0:?}")]
    InvalidKey(String),
}

fn validate_key(key: &str) -> Result<(), ContextError> {
    let reserved = |c: char| c.is_whitespace() || matches!(c, '=' | ',' | '[' | ']');
    if key.is_empty() || key.chars().any(reserved) {
        return Err(ContextError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn collect_pairs<I, K, V>(pairs: I) -> Result<Vec<(String, String)>, ContextError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: ToString,
{
    pairs
        .into_iter()
        .map(|(k, v)| {
            let key = k.into();
            validate_key(&key)?;
            Ok((key, v.to_string()))
        })
        .collect()
}

pub struct LogContext {
    id: usize,
    global: RwLock<Scope>,
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LogContext {
    pub fn new() -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            global: RwLock::new(Scope::new()),
        }
    }

    fn with_thread_scope<R>(&self, f: impl FnOnce(&mut Scope) -> R) -> R {
        THREAD_SCOPES.with(|scopes| f(scopes.borrow_mut().entry(self.id).or_default()))
    }

    /// Merge `pairs` into the global scope, overwriting existing keys.
    pub fn add_global<I, K, V>(&self, pairs: I) -> Result<(), ContextError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let pairs = collect_pairs(pairs)?;
        self.global.write().extend(pairs);
        Ok(())
    }

    /// Replace the global scope with exactly `pairs`.
    pub fn set_global<I, K, V>(&self, pairs: I) -> Result<(), ContextError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let pairs = collect_pairs(pairs)?;
        *self.global.write() = pairs.into_iter().collect();
        Ok(())
    }

    pub fn remove_global(&self, key: &str) {
        self.global.write().remove(key);
    }

    pub fn clear_global(&self) {
        self.global.write().clear();
    }

    pub fn has_global(&self) -> bool {
        !self.global.read().is_empty()
    }

    /// Merge `pairs` into the calling thread's scope, overwriting existing keys.
    pub fn add_threadlocal<I, K, V>(&self, pairs: I) -> Result<(), ContextError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let pairs = collect_pairs(pairs)?;
        self.with_thread_scope(|scope| scope.extend(pairs));
        Ok(())
    }

    /// Replace the calling thread's scope with exactly `pairs`.
    pub fn set_threadlocal<I, K, V>(&self, pairs: I) -> Result<(), ContextError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let pairs = collect_pairs(pairs)?;
        self.with_thread_scope(|scope| *scope = pairs.into_iter().collect());
        Ok(())
    }

    pub fn remove_threadlocal(&self, key: &str) {
        self.with_thread_scope(|scope| scope.remove(key));
    }

    pub fn clear_threadlocal(&self) {
        THREAD_SCOPES.with(|scopes| scopes.borrow_mut().remove(&self.id));
    }

    pub fn has_threadlocal(&self) -> bool {
        THREAD_SCOPES.with(|scopes| {
            scopes
                .borrow()
                .get(&self.id)
                .is_some_and(|scope| !scope.is_empty())
        })
    }

    /// Snapshot of the merged scopes as seen from the calling thread.
    pub fn merged(&self) -> Scope {
        let mut merged = self.global.read().clone();
        THREAD_SCOPES.with(|scopes| {
            if let Some(scope) = scopes.borrow().get(&self.id) {
                merged.extend(scope.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        });
        merged
    }

    /// `[[k=v,...]]` for the calling thread, or `""` when nothing is set.
    pub fn rendered(&self) -> String {
        let merged = self.merged();
        if merged.is_empty() {
            return String::new();
        }
        let body: Vec<String> = merged.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("[[{}]]", body.join(","))
    }
}

impl Drop for LogContext {
    fn drop(&mut self) {
        // Other threads' entries are released when those threads exit.
        let _ = THREAD_SCOPES.try_with(|scopes| scopes.borrow_mut().remove(&self.id));
    }
}
