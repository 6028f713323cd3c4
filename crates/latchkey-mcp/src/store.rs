//! Per-caller secret store.
//!
//! The presence of an entry for a caller is what marks that caller as
//! registered; there is no separate flag. Entries live until the process
//! exits.

use latchkey_core::CallerId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory map from caller to their secret value.
///
/// Shared between handlers as `Arc<SecretStore>`. Every operation takes the
/// lock exactly once, so a racing `set` on the same caller leaves one whole
/// value behind. Callers on different ids do not coordinate beyond that.
#[derive(Debug, Default)]
pub struct SecretStore {
    records: RwLock<HashMap<CallerId, String>>,
}

impl SecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    // No invariant spans more than one map operation; poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<CallerId, String>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CallerId, String>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The stored value, or `None` if the caller is not registered.
    pub fn get(&self, caller: &CallerId) -> Option<String> {
        self.read().get(caller).cloned()
    }

    /// Create or overwrite the caller's value.
    pub fn set(&self, caller: &CallerId, value: impl Into<String>) {
        self.write().insert(caller.clone(), value.into());
    }

    /// Register the caller with an empty value unless already present.
    ///
    /// Returns `true` if a new record was created. An existing value is left
    /// untouched.
    pub fn register(&self, caller: &CallerId) -> bool {
        let mut records = self.write();
        if records.contains_key(caller) {
            return false;
        }
        records.insert(caller.clone(), String::new());
        true
    }

    pub fn is_registered(&self, caller: &CallerId) -> bool {
        self.read().contains_key(caller)
    }

    /// Number of registered callers.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unknown_caller_is_unregistered() {
        let store = SecretStore::new();
        let alice = CallerId::new("alice");

        assert!(store.get(&alice).is_none());
        assert!(!store.is_registered(&alice));
        assert!(store.is_empty());
    }

    #[test]
    fn test_register_creates_empty_record() {
        let store = SecretStore::new();
        let alice = CallerId::new("alice");

        assert!(store.register(&alice));
        assert_eq!(store.get(&alice).as_deref(), Some(""));
        assert!(!store.register(&alice));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_register_keeps_existing_value() {
        let store = SecretStore::new();
        let alice = CallerId::new("alice");

        store.set(&alice, "hunter2");
        assert!(!store.register(&alice));
        assert_eq!(store.get(&alice).as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_set_overwrites() {
        let store = SecretStore::new();
        let alice = CallerId::new("alice");

        store.set(&alice, "one");
        store.set(&alice, "two");
        assert_eq!(store.get(&alice).as_deref(), Some("two"));
    }

    #[test]
    fn test_concurrent_sets_leave_one_value() {
        let store = Arc::new(SecretStore::new());
        let alice = CallerId::new("alice");
        let left = "a".repeat(4096);
        let right = "b".repeat(4096);

        std::thread::scope(|s| {
            for i in 0..16 {
                let store = &store;
                let alice = &alice;
                let value = if i % 2 == 0 { &left } else { &right };
                s.spawn(move || {
                    for _ in 0..100 {
                        store.set(alice, value.as_str());
                    }
                });
            }
        });

        let value = store.get(&alice).unwrap();
        assert!(value == left || value == right);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_callers_are_independent() {
        let store = SecretStore::new();
        let alice = CallerId::new("alice");
        let bob = CallerId::new("bob");

        store.set(&alice, "a");
        assert!(store.get(&bob).is_none());
        store.register(&bob);
        assert_eq!(store.get(&alice).as_deref(), Some("a"));
        assert_eq!(store.get(&bob).as_deref(), Some(""));
    }
}
