use std::sync::Mutex;

use rand::RngCore;
use tracing::{info, warn};
use weft_blob::BlobStore;
use weft_content::{FrozenStore, UserStore};
use weft_crdt::{Counter, CrdtMap, CrdtMerge, CrdtSet, CrdtVector, LwwRegister};
use weft_crypto::ContentHasher;
use weft_delta::{CommitManager, DeltaPhase, RootState};
use weft_kv::{KvStore, MemoryKvStore};
use weft_types::{BlobId, ContextId, ExecutorId, RecordId, StorageId, TypeError};

use crate::clock::MonotonicClock;
use crate::error::{HostError, HostResult};
use crate::event::Event;
use crate::registers::RegisterBank;

/// The host side of one contract execution.
///
/// Owns the execution's identity and every engine the host-call surface
/// reaches. One `Runtime` serves one execution: create it (or rebuild it
/// from a previous execution's parts), run the guest against it, then
/// either let the guest finish with `commit`/`flush_delta` or call
/// [`abort`](Self::abort) on fatal failure.
pub struct Runtime<S: KvStore = MemoryKvStore> {
    context: ContextId,
    executor: ExecutorId,
    input: Vec<u8>,
    store: CommitManager<S>,
    blobs: BlobStore,
    registers: RegisterBank,
    clock: MonotonicClock,
    events: Mutex<Vec<Event>>,
}

impl Runtime<MemoryKvStore> {
    /// Create a runtime over a fresh in-memory store.
    pub fn new(context: ContextId, executor: ExecutorId) -> Self {
        Self::from_parts(
            context,
            executor,
            Vec::new(),
            MemoryKvStore::new(),
            BlobStore::new(),
        )
    }
}

impl<S: KvStore> Runtime<S> {
    /// Rebuild a runtime from a previous execution's surviving state.
    pub fn from_parts(
        context: ContextId,
        executor: ExecutorId,
        input: Vec<u8>,
        store: S,
        blobs: BlobStore,
    ) -> Self {
        blobs.register_context(context);
        Self {
            context,
            executor,
            input,
            store: CommitManager::new(store),
            blobs,
            registers: RegisterBank::new(),
            clock: MonotonicClock::new(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Tear down, returning the state that survives the execution.
    ///
    /// Any unconsumed pending delta is dropped with the manager.
    pub fn into_parts(self) -> (S, BlobStore) {
        (self.store.into_inner(), self.blobs)
    }

    // -----------------------------------------------------------------------
    // Execution identity
    // -----------------------------------------------------------------------

    /// The replication scope this execution runs inside.
    pub fn context_id(&self) -> &ContextId {
        &self.context
    }

    /// The principal performing this execution.
    pub fn executor_id(&self) -> &ExecutorId {
        &self.executor
    }

    /// The execution's input payload.
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    /// The register bank.
    pub fn registers(&self) -> &RegisterBank {
        &self.registers
    }

    /// The delta-recording store / commit manager.
    pub fn store(&self) -> &CommitManager<S> {
        &self.store
    }

    /// The blob store.
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    // -----------------------------------------------------------------------
    // Misc host operations
    // -----------------------------------------------------------------------

    /// Current time, nanoseconds since the UNIX epoch, strictly monotonic
    /// within this execution.
    pub fn time_now(&self) -> u64 {
        self.clock.now_ns()
    }

    /// `len` cryptographically random bytes.
    pub fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    /// Route a guest log line into host logging.
    pub fn log(&self, message: &str) {
        info!(target: "weft::guest", "{message}");
    }

    /// Verify a detached ed25519 signature.
    ///
    /// The signature must be exactly 64 bytes and the key 32; anything
    /// else is a boundary violation, not a failed verification.
    pub fn ed25519_verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> HostResult<bool> {
        let signature: &[u8; 64] =
            signature
                .try_into()
                .map_err(|_| HostError::boundary("signature", TypeError::InvalidLength {
                    expected: 64,
                    actual: signature.len(),
                }))?;
        let public_key: &[u8; 32] =
            public_key
                .try_into()
                .map_err(|_| HostError::boundary("public_key", TypeError::InvalidLength {
                    expected: 32,
                    actual: public_key.len(),
                }))?;
        Ok(weft_crypto::verify_detached(message, signature, public_key))
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Emit an application event.
    pub fn emit(&self, kind: &str, data: &[u8]) {
        self.events
            .lock()
            .expect("lock poisoned")
            .push(Event::new(kind, data.to_vec()));
    }

    /// Emit an application event targeted at a handler.
    pub fn emit_with_handler(&self, kind: &str, data: &[u8], handler: &[u8]) {
        self.events
            .lock()
            .expect("lock poisoned")
            .push(Event::with_handler(kind, data.to_vec(), handler.to_vec()));
    }

    /// Drain the event outbox.
    pub fn drain_events(&self) -> Vec<Event> {
        std::mem::take(&mut self.events.lock().expect("lock poisoned"))
    }

    // -----------------------------------------------------------------------
    // Raw storage
    // -----------------------------------------------------------------------

    /// Read a raw storage value.
    pub fn storage_read(&self, key: &[u8]) -> HostResult<Option<Vec<u8>>> {
        Ok(self.store.get(key)?)
    }

    /// Write a raw storage value. Returns the previous value, if any.
    pub fn storage_write(&self, key: &[u8], value: &[u8]) -> HostResult<Option<Vec<u8>>> {
        let previous = self.store.get(key)?;
        self.store.put(key, value)?;
        Ok(previous)
    }

    /// Remove a raw storage value. Returns the removed value, if any.
    pub fn storage_remove(&self, key: &[u8]) -> HostResult<Option<Vec<u8>>> {
        let previous = self.store.get(key)?;
        if previous.is_some() {
            self.store.delete(key)?;
        }
        Ok(previous)
    }

    // -----------------------------------------------------------------------
    // CRDT primitives
    // -----------------------------------------------------------------------

    /// Mint a fresh 32-byte entity id.
    fn mint_id(&self) -> Vec<u8> {
        self.random_bytes(32)
    }

    /// Create a new map. Returns its entity id.
    pub fn map_new(&self) -> Vec<u8> {
        self.mint_id()
    }

    pub fn map_get(&self, id: &[u8], key: &[u8]) -> HostResult<Option<Vec<u8>>> {
        Ok(CrdtMap::open(&self.store, id).get(key)?)
    }

    pub fn map_insert(&self, id: &[u8], key: &[u8], value: &[u8]) -> HostResult<Option<Vec<u8>>> {
        Ok(CrdtMap::open(&self.store, id).insert(key, value)?)
    }

    pub fn map_remove(&self, id: &[u8], key: &[u8]) -> HostResult<Option<Vec<u8>>> {
        Ok(CrdtMap::open(&self.store, id).remove(key)?)
    }

    pub fn map_contains(&self, id: &[u8], key: &[u8]) -> HostResult<bool> {
        Ok(CrdtMap::open(&self.store, id).contains(key)?)
    }

    /// Snapshot of the map's live entries in stable key order.
    pub fn map_entries(&self, id: &[u8]) -> HostResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(CrdtMap::open(&self.store, id).entries()?)
    }

    /// Create a new vector. Returns its entity id.
    pub fn vector_new(&self) -> Vec<u8> {
        self.mint_id()
    }

    pub fn vector_len(&self, id: &[u8]) -> HostResult<u64> {
        Ok(CrdtVector::open(&self.store, id).len()?)
    }

    pub fn vector_push(&self, id: &[u8], value: &[u8]) -> HostResult<u64> {
        Ok(CrdtVector::open(&self.store, id).push(value)?)
    }

    pub fn vector_get(&self, id: &[u8], index: u64) -> HostResult<Option<Vec<u8>>> {
        Ok(CrdtVector::open(&self.store, id).get(index)?)
    }

    pub fn vector_pop(&self, id: &[u8]) -> HostResult<Option<Vec<u8>>> {
        Ok(CrdtVector::open(&self.store, id).pop()?)
    }

    /// Create a new set. Returns its entity id.
    pub fn set_new(&self) -> Vec<u8> {
        self.mint_id()
    }

    pub fn set_insert(&self, id: &[u8], member: &[u8]) -> HostResult<bool> {
        Ok(CrdtSet::open(&self.store, id).insert(member)?)
    }

    pub fn set_contains(&self, id: &[u8], member: &[u8]) -> HostResult<bool> {
        Ok(CrdtSet::open(&self.store, id).contains(member)?)
    }

    pub fn set_remove(&self, id: &[u8], member: &[u8]) -> HostResult<bool> {
        Ok(CrdtSet::open(&self.store, id).remove(member)?)
    }

    pub fn set_len(&self, id: &[u8]) -> HostResult<u64> {
        Ok(CrdtSet::open(&self.store, id).len()? as u64)
    }

    /// Snapshot of the set's members in stable byte order.
    pub fn set_members(&self, id: &[u8]) -> HostResult<Vec<Vec<u8>>> {
        Ok(CrdtSet::open(&self.store, id).members()?)
    }

    pub fn set_clear(&self, id: &[u8]) -> HostResult<u64> {
        Ok(CrdtSet::open(&self.store, id).clear()?)
    }

    /// Create a new LWW register. Returns its entity id.
    pub fn lww_new(&self) -> Vec<u8> {
        self.mint_id()
    }

    /// Write the register, stamped with the current time and this
    /// execution's executor. Returns `true` if the write won.
    pub fn lww_set(&self, id: &[u8], value: Option<&[u8]>) -> HostResult<bool> {
        let timestamp_ns = self.clock.now_ns();
        Ok(LwwRegister::open(&self.store, id).set(value, timestamp_ns, &self.executor)?)
    }

    pub fn lww_get(&self, id: &[u8]) -> HostResult<Option<Vec<u8>>> {
        Ok(LwwRegister::open(&self.store, id).get()?)
    }

    pub fn lww_timestamp(&self, id: &[u8]) -> HostResult<Option<u64>> {
        Ok(LwwRegister::open(&self.store, id).timestamp()?)
    }

    /// Create a new counter. Returns its entity id.
    pub fn counter_new(&self) -> Vec<u8> {
        self.mint_id()
    }

    /// Add 1 to this execution's executor shard.
    pub fn counter_increment(&self, id: &[u8]) -> HostResult<u64> {
        Ok(Counter::open(&self.store, id).increment(&self.executor)?)
    }

    pub fn counter_value(&self, id: &[u8]) -> HostResult<u64> {
        Ok(Counter::open(&self.store, id).value()?)
    }

    /// One executor's shard count, or the global value when `executor` is
    /// omitted.
    pub fn counter_executor_count(
        &self,
        id: &[u8],
        executor: Option<&ExecutorId>,
    ) -> HostResult<u64> {
        Ok(Counter::open(&self.store, id).executor_count(executor)?)
    }

    // -----------------------------------------------------------------------
    // User / frozen storage
    // -----------------------------------------------------------------------

    /// Create a new user-storage instance. Returns its id.
    pub fn user_storage_new(&self) -> StorageId {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        StorageId::from_array(bytes)
    }

    /// Insert or overwrite this executor's record.
    pub fn user_storage_insert(&self, storage: &StorageId, value: &[u8]) -> HostResult<RecordId> {
        Ok(UserStore::open(&self.store, *storage).insert(&self.executor, value)?)
    }

    /// This executor's own latest record.
    pub fn user_storage_get(&self, storage: &StorageId) -> HostResult<Option<Vec<u8>>> {
        Ok(UserStore::open(&self.store, *storage).get(&self.executor)?)
    }

    /// Another principal's record.
    pub fn user_storage_get_for_user(
        &self,
        storage: &StorageId,
        user_key: &ExecutorId,
    ) -> HostResult<Option<Vec<u8>>> {
        Ok(UserStore::open(&self.store, *storage).get_for_user(user_key)?)
    }

    /// Remove this executor's record.
    pub fn user_storage_remove(&self, storage: &StorageId) -> HostResult<bool> {
        Ok(UserStore::open(&self.store, *storage).remove(&self.executor)?)
    }

    /// Whether this executor has a record.
    pub fn user_storage_contains(&self, storage: &StorageId) -> HostResult<bool> {
        Ok(UserStore::open(&self.store, *storage).contains(&self.executor)?)
    }

    /// Whether another principal has a record.
    pub fn user_storage_contains_user(
        &self,
        storage: &StorageId,
        user_key: &ExecutorId,
    ) -> HostResult<bool> {
        Ok(UserStore::open(&self.store, *storage).contains_user(user_key)?)
    }

    /// Create a new frozen-storage instance. Returns its id.
    pub fn frozen_storage_new(&self) -> StorageId {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        StorageId::from_array(bytes)
    }

    /// Add content to frozen storage, computing its hash on the caller
    /// side of the engine boundary. Returns the hash; idempotent.
    pub fn frozen_storage_add(&self, storage: &StorageId, value: &[u8]) -> HostResult<[u8; 32]> {
        let hash = ContentHasher::FROZEN.hash(value);
        FrozenStore::open(&self.store, *storage).add(&hash, value)?;
        Ok(hash)
    }

    pub fn frozen_storage_get(
        &self,
        storage: &StorageId,
        hash: &[u8; 32],
    ) -> HostResult<Option<Vec<u8>>> {
        Ok(FrozenStore::open(&self.store, *storage).get(hash)?)
    }

    pub fn frozen_storage_contains(
        &self,
        storage: &StorageId,
        hash: &[u8; 32],
    ) -> HostResult<bool> {
        Ok(FrozenStore::open(&self.store, *storage).contains(hash)?)
    }

    // -----------------------------------------------------------------------
    // Delta & root state
    // -----------------------------------------------------------------------

    /// Persist `artifact` under `root_hash` and terminally consume the
    /// pending delta.
    pub fn commit(&self, root_hash: &[u8; 32], artifact: &[u8]) -> HostResult<()> {
        Ok(self.store.commit(root_hash, artifact)?)
    }

    /// Serialize and hand off the pending delta. `None` when nothing was
    /// recorded.
    pub fn flush_delta(&self) -> HostResult<Option<Vec<u8>>> {
        Ok(self.store.flush_delta()?)
    }

    /// Replay a foreign delta with CRDT-aware value merging.
    pub fn apply_storage_delta(&self, bytes: &[u8]) -> HostResult<u64> {
        Ok(self.store.apply_storage_delta(bytes, &CrdtMerge)?)
    }

    /// Overwrite the canonical root snapshot.
    pub fn persist_root_state(
        &self,
        document: &[u8],
        created_at: u64,
        updated_at: u64,
    ) -> HostResult<()> {
        Ok(self.store.persist_root_state(document, created_at, updated_at)?)
    }

    /// Read the canonical root snapshot.
    pub fn read_root_state(&self) -> HostResult<Option<RootState>> {
        Ok(self.store.read_root_state()?)
    }

    /// The current delta phase.
    pub fn delta_phase(&self) -> DeltaPhase {
        self.store.phase()
    }

    // -----------------------------------------------------------------------
    // Blobs
    // -----------------------------------------------------------------------

    /// Open a write handle for a new blob.
    pub fn blob_create(&self) -> u64 {
        self.blobs.create()
    }

    /// Open a read handle on a completed blob.
    pub fn blob_open(&self, id: &BlobId) -> Option<u64> {
        self.blobs.open(id)
    }

    /// Read up to `len` bytes from a read handle.
    pub fn blob_read(&self, fd: u64, len: usize) -> HostResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let n = self.blobs.read(fd, &mut buf)? as usize;
        buf.truncate(n);
        Ok(buf)
    }

    /// Append to a write handle. Returns the number of bytes written.
    pub fn blob_write(&self, fd: u64, data: &[u8]) -> HostResult<u64> {
        Ok(self.blobs.write(fd, data)?)
    }

    /// Close a handle; for writers this finalizes the content identity.
    pub fn blob_close(&self, fd: u64) -> HostResult<BlobId> {
        Ok(self.blobs.close(fd)?)
    }

    /// Announce a completed blob to a replication scope.
    pub fn blob_announce_to_context(&self, blob: &BlobId, context: &ContextId) -> bool {
        self.blobs.announce_to_context(blob, context)
    }

    // -----------------------------------------------------------------------
    // Fatal termination
    // -----------------------------------------------------------------------

    /// Abort the execution: discard the pending delta, clear the register
    /// bank, and drop unemitted events.
    ///
    /// Previously committed root state and the KV ground truth stay as
    /// they are — nothing already persisted is rolled back.
    pub fn abort(&self) {
        warn!(executor = %self.executor.short_hex(), "execution aborted");
        self.store.discard();
        self.registers.clear_all();
        self.events.lock().expect("lock poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(byte: u8) -> ContextId {
        ContextId::from_array([byte; 32])
    }

    fn executor(byte: u8) -> ExecutorId {
        ExecutorId::from_array([byte; 32])
    }

    fn runtime() -> Runtime {
        Runtime::new(context(0xC0), executor(0xE0))
    }

    // -----------------------------------------------------------------------
    // Cross-executor counter semantics
    // -----------------------------------------------------------------------

    #[test]
    fn counter_sums_across_executions() {
        let rt_a = Runtime::new(context(1), executor(1));
        let id = rt_a.counter_new();
        for _ in 0..3 {
            rt_a.counter_increment(&id).unwrap();
        }
        let (store, blobs) = rt_a.into_parts();

        let rt_b = Runtime::from_parts(context(1), executor(2), Vec::new(), store, blobs);
        for _ in 0..2 {
            rt_b.counter_increment(&id).unwrap();
        }

        assert_eq!(rt_b.counter_value(&id).unwrap(), 5);
        assert_eq!(
            rt_b.counter_executor_count(&id, Some(&executor(1))).unwrap(),
            3
        );
        assert_eq!(
            rt_b.counter_executor_count(&id, Some(&executor(2))).unwrap(),
            2
        );
        assert_eq!(rt_b.counter_executor_count(&id, None).unwrap(), 5);
    }

    // -----------------------------------------------------------------------
    // LWW via the runtime clock
    // -----------------------------------------------------------------------

    #[test]
    fn lww_set_get_timestamp() {
        let rt = runtime();
        let id = rt.lww_new();
        assert!(rt.lww_set(&id, Some(b"v1")).unwrap());
        let t1 = rt.lww_timestamp(&id).unwrap().unwrap();
        assert!(rt.lww_set(&id, Some(b"v2")).unwrap());
        let t2 = rt.lww_timestamp(&id).unwrap().unwrap();
        assert!(t2 > t1, "runtime clock must move the register forward");
        assert_eq!(rt.lww_get(&id).unwrap(), Some(b"v2".to_vec()));
    }

    // -----------------------------------------------------------------------
    // Delta round-trip across runtimes
    // -----------------------------------------------------------------------

    #[test]
    fn flushed_delta_replays_onto_fresh_runtime() {
        let source = runtime();
        let map_id = source.map_new();
        source.map_insert(&map_id, b"a", b"1").unwrap();
        source.map_insert(&map_id, b"b", b"2").unwrap();
        source.map_remove(&map_id, b"a").unwrap();
        source.storage_write(b"raw-key", b"raw-value").unwrap();
        let bytes = source.flush_delta().unwrap().expect("delta emitted");

        let target = runtime();
        target.apply_storage_delta(&bytes).unwrap();
        assert_eq!(
            target.map_entries(&map_id).unwrap(),
            vec![(b"b".to_vec(), b"2".to_vec())]
        );
        assert_eq!(
            target.storage_read(b"raw-key").unwrap(),
            Some(b"raw-value".to_vec())
        );
    }

    #[test]
    fn lww_replay_does_not_regress_local_winner() {
        // Remote writes first (older timestamp), local writes later.
        let remote = Runtime::new(context(1), executor(1));
        let id = remote.lww_new();
        remote.lww_set(&id, Some(b"remote")).unwrap();
        let delta = remote.flush_delta().unwrap().unwrap();

        let local = Runtime::new(context(1), executor(2));
        // Local clock reads after the remote's flush, so this write is newer.
        local.lww_set(&id, Some(b"local")).unwrap();
        local.apply_storage_delta(&delta).unwrap();
        assert_eq!(local.lww_get(&id).unwrap(), Some(b"local".to_vec()));

        // A fresh replica with no competing write takes the remote value.
        let fresh = Runtime::new(context(1), executor(3));
        fresh.apply_storage_delta(&delta).unwrap();
        assert_eq!(fresh.lww_get(&id).unwrap(), Some(b"remote".to_vec()));
    }

    // -----------------------------------------------------------------------
    // Commit and root state
    // -----------------------------------------------------------------------

    #[test]
    fn commit_then_root_state_roundtrip() {
        let rt = runtime();
        rt.storage_write(b"k", b"v").unwrap();
        let root_hash = [0x7a; 32];
        rt.commit(&root_hash, b"artifact").unwrap();
        assert_eq!(rt.delta_phase(), DeltaPhase::Committed);

        rt.persist_root_state(b"document", 10, 20).unwrap();
        let state = rt.read_root_state().unwrap().unwrap();
        assert_eq!(state.document, b"document");
        assert_eq!((state.created_at, state.updated_at), (10, 20));
    }

    // -----------------------------------------------------------------------
    // Frozen storage through the runtime boundary
    // -----------------------------------------------------------------------

    #[test]
    fn frozen_add_hashes_on_the_caller_side() {
        let rt = runtime();
        let storage = rt.frozen_storage_new();
        let hash = rt.frozen_storage_add(&storage, b"content").unwrap();
        assert_eq!(hash, ContentHasher::FROZEN.hash(b"content"));
        assert!(rt.frozen_storage_contains(&storage, &hash).unwrap());

        // Idempotent re-add: same hash back, record intact.
        let again = rt.frozen_storage_add(&storage, b"content").unwrap();
        assert_eq!(again, hash);
        assert_eq!(
            rt.frozen_storage_get(&storage, &hash).unwrap(),
            Some(b"content".to_vec())
        );
    }

    // -----------------------------------------------------------------------
    // User storage capability split
    // -----------------------------------------------------------------------

    #[test]
    fn user_storage_own_vs_other() {
        let rt_a = Runtime::new(context(1), executor(1));
        let storage = rt_a.user_storage_new();
        rt_a.user_storage_insert(&storage, b"a's value").unwrap();
        let (store, blobs) = rt_a.into_parts();

        let rt_b = Runtime::from_parts(context(1), executor(2), Vec::new(), store, blobs);
        assert_eq!(rt_b.user_storage_get(&storage).unwrap(), None);
        assert!(!rt_b.user_storage_contains(&storage).unwrap());
        assert_eq!(
            rt_b.user_storage_get_for_user(&storage, &executor(1)).unwrap(),
            Some(b"a's value".to_vec())
        );
        assert!(rt_b
            .user_storage_contains_user(&storage, &executor(1))
            .unwrap());
    }

    // -----------------------------------------------------------------------
    // Boundary validation
    // -----------------------------------------------------------------------

    #[test]
    fn ed25519_verify_validates_lengths() {
        let rt = runtime();
        let err = rt.ed25519_verify(b"m", &[0u8; 63], &[0u8; 32]).unwrap_err();
        assert!(err.is_boundary());
        let err = rt.ed25519_verify(b"m", &[0u8; 64], &[0u8; 31]).unwrap_err();
        assert!(err.is_boundary());
    }

    #[test]
    fn ed25519_verify_roundtrip() {
        let rt = runtime();
        let key = weft_crypto::SigningKey::generate();
        let sig = key.sign(b"message").to_bytes();
        let pk = key.verifying_key().as_bytes();
        assert!(rt.ed25519_verify(b"message", &sig, &pk).unwrap());
        assert!(!rt.ed25519_verify(b"other", &sig, &pk).unwrap());
    }

    // -----------------------------------------------------------------------
    // Misc operations
    // -----------------------------------------------------------------------

    #[test]
    fn random_bytes_has_requested_length() {
        let rt = runtime();
        assert_eq!(rt.random_bytes(0).len(), 0);
        assert_eq!(rt.random_bytes(32).len(), 32);
        // Two draws of 32 bytes colliding would mean a broken RNG.
        assert_ne!(rt.random_bytes(32), rt.random_bytes(32));
    }

    #[test]
    fn minted_entity_ids_are_distinct() {
        let rt = runtime();
        assert_ne!(rt.map_new(), rt.map_new());
        assert_ne!(rt.user_storage_new(), rt.user_storage_new());
    }

    #[test]
    fn events_accumulate_and_drain() {
        let rt = runtime();
        rt.emit("transfer", b"payload");
        rt.emit_with_handler("notify", b"data", b"handler-1");
        let events = rt.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, "transfer");
        assert_eq!(events[1].handler, Some(b"handler-1".to_vec()));
        assert!(rt.drain_events().is_empty());
    }

    // -----------------------------------------------------------------------
    // Abort
    // -----------------------------------------------------------------------

    #[test]
    fn abort_discards_transient_state_only() {
        let rt = runtime();
        rt.persist_root_state(b"doc", 1, 1).unwrap();
        rt.storage_write(b"k", b"v").unwrap();
        rt.registers().set(0, b"stale".to_vec());
        rt.emit("event", b"");

        rt.abort();

        assert_eq!(rt.delta_phase(), DeltaPhase::Idle);
        assert_eq!(rt.flush_delta().unwrap(), None);
        assert_eq!(rt.registers().take(0), None);
        assert!(rt.drain_events().is_empty());
        // Committed root state is untouched.
        assert_eq!(rt.read_root_state().unwrap().unwrap().document, b"doc");
    }
}
