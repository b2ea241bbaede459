use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

/// Transient per-call byte-buffer slots.
///
/// A register is written by a host operation that returns variable-length
/// data through the ABI, then consumed by the single next read: `take`
/// removes the slot, so a second read observes nothing. `clear_all` runs
/// between executions so stale data never leaks into an unrelated call.
pub struct RegisterBank {
    slots: Mutex<HashMap<u64, Vec<u8>>>,
}

impl RegisterBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Store `data` in register `id`, replacing any previous contents.
    pub fn set(&self, id: u64, data: Vec<u8>) {
        self.slots.lock().expect("lock poisoned").insert(id, data);
    }

    /// Length of the buffer in register `id`, without consuming it.
    pub fn len(&self, id: u64) -> Option<u64> {
        self.slots
            .lock()
            .expect("lock poisoned")
            .get(&id)
            .map(|data| data.len() as u64)
    }

    /// Consume and return the buffer in register `id`.
    ///
    /// The register is invalidated: a second `take` returns `None`.
    pub fn take(&self, id: u64) -> Option<Vec<u8>> {
        self.slots.lock().expect("lock poisoned").remove(&id)
    }

    /// Number of occupied registers.
    pub fn occupied(&self) -> usize {
        self.slots.lock().expect("lock poisoned").len()
    }

    /// Invalidate every register.
    pub fn clear_all(&self) {
        let mut slots = self.slots.lock().expect("lock poisoned");
        if !slots.is_empty() {
            debug!(cleared = slots.len(), "cleared register bank");
        }
        slots.clear();
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}
