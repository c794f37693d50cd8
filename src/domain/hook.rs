//! Observable value cell with asynchronous change hooks.
//!
//! A `HookableValue` decouples "a status changed" from "how it is
//! shown": any number of sinks can subscribe without the pipeline
//! knowing about presentation.

use crate::error::Result;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Change observer: receives `(new_value, old_value)`.
pub type HookCallback<T> =
    Arc<dyn Fn(Option<T>, Option<T>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// A named value that invokes registered hooks when it changes.
///
/// Hooks are awaited sequentially, in registration order; a write does
/// not return until every hook has run. Writes to the same cell are
/// serialized, so a later write always compares against the fully
/// propagated previous value.
pub struct HookableValue<T> {
    name: String,
    value: Mutex<Option<T>>,
    callbacks: Arc<Mutex<Vec<(u64, HookCallback<T>)>>>,
    next_id: AtomicU64,
    write_gate: tokio::sync::Mutex<()>,
}

impl<T> HookableValue<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a cell with a default value
    pub fn new(name: impl Into<String>, default: Option<T>) -> Self {
        Self {
            name: name.into(),
            value: Mutex::new(default),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// The name of this cell, for logging
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value; never suspends
    pub fn get_value(&self) -> Option<T> {
        self.value.lock().unwrap().clone()
    }

    /// Set the value and run all hooks if it changed.
    ///
    /// A write equal to the current value is a no-op. A hook error
    /// propagates to the caller; the value stays written and remaining
    /// hooks are skipped.
    ///
    /// Writes are not reentrant: a hook that writes back to the cell
    /// it observes deadlocks on the write gate.
    pub async fn set_value(&self, new_value: Option<T>) -> Result<()> {
        let _write = self.write_gate.lock().await;

        let (old_value, hooks) = {
            let mut value = self.value.lock().unwrap();
            if *value == new_value {
                return Ok(());
            }
            let old_value = value.clone();
            *value = new_value.clone();
            let hooks: Vec<HookCallback<T>> = self
                .callbacks
                .lock()
                .unwrap()
                .iter()
                .map(|(_, cb)| Arc::clone(cb))
                .collect();
            (old_value, hooks)
        };

        for hook in hooks {
            hook(new_value.clone(), old_value.clone()).await?;
        }
        Ok(())
    }

    /// Convenience wrapper for `set_value(Some(value))`
    pub async fn set(&self, value: T) -> Result<()> {
        self.set_value(Some(value)).await
    }

    /// Register a hook; the returned registration removes exactly this
    /// hook when `unregister` is called
    pub fn register<F>(&self, callback: F) -> HookRegistration<T>
    where
        F: Fn(Option<T>, Option<T>) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.lock().unwrap().push((id, Arc::new(callback)));
        HookRegistration {
            id,
            callbacks: Arc::clone(&self.callbacks),
        }
    }

    /// Remove all registered hooks
    pub fn clear_callbacks(&self) {
        self.callbacks.lock().unwrap().clear();
    }
}

/// Capability to remove one registered hook.
///
/// Dropping a registration does not unregister; startup wiring can
/// register and forget.
pub struct HookRegistration<T> {
    id: u64,
    callbacks: Arc<Mutex<Vec<(u64, HookCallback<T>)>>>,
}

impl<T> HookRegistration<T> {
    /// Remove the hook this registration was created for; idempotent
    pub fn unregister(&self) {
        self.callbacks.lock().unwrap().retain(|(id, _)| *id != self.id);
    }
}
