use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;
use weft_kv::{KvError, KvResult, KvStore};
use weft_types::keyspace::{self, TAG_META};

use crate::delta::Delta;
use crate::error::{DeltaError, DeltaResult};
use crate::merge::Merge;
use crate::op::DeltaOp;

/// Metadata entity holding the canonical root snapshot.
const ROOT_STATE_ID: &[u8] = b"root-state";
/// Metadata entity holding commit artifacts, keyed by root hash.
const COMMIT_ID: &[u8] = b"commit";

/// Lifecycle of one execution's delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaPhase {
    /// No pending changes.
    Idle,
    /// At least one mutation has been recorded.
    Accumulating,
    /// The delta was consumed by `commit`. Terminal for this execution.
    Committed,
    /// The delta was consumed by `flush_delta`. Terminal for this execution.
    Flushed,
}

impl DeltaPhase {
    /// Returns `true` once the delta has been terminally consumed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Flushed)
    }
}

/// The canonical persisted snapshot of an application's state document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootState {
    /// The application state document.
    pub document: Vec<u8>,
    /// Creation timestamp, nanoseconds since the UNIX epoch.
    pub created_at: u64,
    /// Last-update timestamp, nanoseconds since the UNIX epoch.
    pub updated_at: u64,
}

struct ExecutionState {
    phase: DeltaPhase,
    pending: Delta,
}

/// Delta-recording store wrapper and commit manager.
///
/// Implements [`KvStore`]: reads pass through to the inner store, while
/// every mutation is applied to the inner store immediately *and* appended
/// to the pending delta. Higher layers (CRDT primitives, content stores)
/// operate on the manager exactly as on any store and get delta recording
/// for free.
///
/// The pending delta is exclusively owned by the current execution. It is
/// terminally consumed by [`commit`](Self::commit) or
/// [`flush_delta`](Self::flush_delta); any mutation after that fails with
/// [`KvError::Finalized`]. [`discard`](Self::discard) drops pending state
/// without persisting anything — the fatal-termination path.
pub struct CommitManager<S> {
    inner: S,
    state: Mutex<ExecutionState>,
}

impl<S: KvStore> CommitManager<S> {
    /// Wrap an inner store with a fresh, idle delta.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            state: Mutex::new(ExecutionState {
                phase: DeltaPhase::Idle,
                pending: Delta::new(),
            }),
        }
    }

    /// The current delta phase.
    pub fn phase(&self) -> DeltaPhase {
        self.state.lock().expect("lock poisoned").phase
    }

    /// Number of operations recorded so far this execution.
    pub fn pending_len(&self) -> usize {
        self.state.lock().expect("lock poisoned").pending.len()
    }

    /// The wrapped inner store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap the inner store, dropping any pending delta state.
    ///
    /// Used between executions: the ground truth survives, the consumed
    /// (or abandoned) delta does not.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Persist `artifact` keyed by the caller-supplied root hash and
    /// terminally consume the pending delta.
    ///
    /// All-or-nothing: the artifact write happens before any pending state
    /// is dropped, so a failed write leaves the execution able to retry or
    /// abort with its delta intact.
    pub fn commit(&self, root_hash: &[u8; 32], artifact: &[u8]) -> DeltaResult<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.phase.is_terminal() {
            return Err(DeltaError::TerminalPhase(state.phase));
        }
        self.inner
            .put(&keyspace::entity_key(TAG_META, COMMIT_ID, root_hash), artifact)?;
        let ops = state.pending.len();
        state.pending.clear();
        state.phase = DeltaPhase::Committed;
        debug!(root = %hex_preview(root_hash), ops, "committed execution delta");
        Ok(())
    }

    /// Read back a previously committed artifact.
    pub fn read_commit(&self, root_hash: &[u8; 32]) -> DeltaResult<Option<Vec<u8>>> {
        Ok(self
            .inner
            .get(&keyspace::entity_key(TAG_META, COMMIT_ID, root_hash))?)
    }

    /// Serialize and hand off the pending delta without committing.
    ///
    /// Returns `None` when nothing has been recorded (and leaves the phase
    /// untouched so an execution that never mutated stays `Idle`).
    pub fn flush_delta(&self) -> DeltaResult<Option<Vec<u8>>> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.phase.is_terminal() {
            return Err(DeltaError::TerminalPhase(state.phase));
        }
        if state.pending.is_empty() {
            return Ok(None);
        }
        let bytes = state.pending.encode()?;
        let ops = state.pending.len();
        state.pending.clear();
        state.phase = DeltaPhase::Flushed;
        debug!(ops, bytes = bytes.len(), "flushed execution delta");
        Ok(Some(bytes))
    }

    /// Overwrite the canonical root snapshot. Independent of the delta
    /// lifecycle — this does not touch the pending delta or its phase.
    pub fn persist_root_state(
        &self,
        document: &[u8],
        created_at: u64,
        updated_at: u64,
    ) -> DeltaResult<()> {
        let root = RootState {
            document: document.to_vec(),
            created_at,
            updated_at,
        };
        let bytes =
            bincode::serialize(&root).map_err(|e| DeltaError::Serialization(e.to_string()))?;
        self.inner
            .put(&keyspace::entity_prefix(TAG_META, ROOT_STATE_ID), &bytes)?;
        Ok(())
    }

    /// Read the canonical root snapshot, if one has been persisted.
    pub fn read_root_state(&self) -> DeltaResult<Option<RootState>> {
        let key = keyspace::entity_prefix(TAG_META, ROOT_STATE_ID);
        match self.inner.get(&key)? {
            Some(bytes) => {
                let root = bincode::deserialize(&bytes)
                    .map_err(|e| DeltaError::Serialization(e.to_string()))?;
                Ok(Some(root))
            }
            None => Ok(None),
        }
    }

    /// Replay a foreign delta's operations onto the inner store, in the
    /// order they were recorded.
    ///
    /// `Put` values are routed through `merger` so replicated value types
    /// reconcile with local state. Replayed operations are applied directly
    /// to the inner store — they are not recorded into the pending delta.
    /// The manager does not deduplicate: applying the same delta twice
    /// re-runs its operations.
    ///
    /// Returns the number of operations applied.
    pub fn apply_storage_delta(&self, bytes: &[u8], merger: &dyn Merge) -> DeltaResult<u64> {
        let delta = Delta::decode(bytes)?;
        let mut applied = 0u64;
        for op in delta.ops() {
            match op {
                DeltaOp::Put { key, value } => {
                    let existing = self.inner.get(key)?;
                    let merged = merger.merge(key, existing.as_deref(), value);
                    self.inner.put(key, &merged)?;
                }
                DeltaOp::Delete { key } => {
                    self.inner.delete(key)?;
                }
                DeltaOp::Truncate { prefix } => {
                    self.inner.remove_prefix(prefix)?;
                }
            }
            applied += 1;
        }
        debug!(applied, "applied foreign storage delta");
        Ok(applied)
    }

    /// Drop all pending delta state without persisting any of it.
    ///
    /// Called on fatal termination of an execution: previously committed
    /// root state stays untouched, and no partial delta survives.
    pub fn discard(&self) {
        let mut state = self.state.lock().expect("lock poisoned");
        let dropped = state.pending.len();
        state.pending.clear();
        state.phase = DeltaPhase::Idle;
        if dropped > 0 {
            debug!(dropped, "discarded pending delta");
        }
    }

    fn record(&self, op: DeltaOp) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.pending.push(op);
        if state.phase == DeltaPhase::Idle {
            state.phase = DeltaPhase::Accumulating;
        }
    }

    fn reject_if_terminal(&self) -> KvResult<()> {
        if self.state.lock().expect("lock poisoned").phase.is_terminal() {
            return Err(KvError::Finalized);
        }
        Ok(())
    }
}

impl<S: KvStore> KvStore for CommitManager<S> {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<bool> {
        self.reject_if_terminal()?;
        let existed = self.inner.put(key, value)?;
        self.record(DeltaOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(existed)
    }

    fn delete(&self, key: &[u8]) -> KvResult<bool> {
        self.reject_if_terminal()?;
        let existed = self.inner.delete(key)?;
        self.record(DeltaOp::Delete { key: key.to_vec() });
        Ok(existed)
    }

    fn contains(&self, key: &[u8]) -> KvResult<bool> {
        self.inner.contains(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.inner.scan_prefix(prefix)
    }

    fn remove_prefix(&self, prefix: &[u8]) -> KvResult<u64> {
        self.reject_if_terminal()?;
        let removed = self.inner.remove_prefix(prefix)?;
        self.record(DeltaOp::Truncate {
            prefix: prefix.to_vec(),
        });
        Ok(removed)
    }
}

fn hex_preview(hash: &[u8; 32]) -> String {
    hash.iter().take(4).map(|b| format!("{b:02x}")).collect()
}
