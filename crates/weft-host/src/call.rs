use weft_delta::RootState;
use weft_kv::KvStore;
use weft_types::{BlobId, ContextId, ExecutorId, StorageId, TypeError};

use crate::error::{HostError, HostResult};
use crate::runtime::Runtime;

/// One operation of the host-call surface, in typed form.
///
/// This is the reimplementation of the original pointer/length ABI: every
/// operation is a variant whose fixed-size arguments are already typed, so
/// a malformed id cannot exist inside a `HostCall`. Use the checked
/// constructors (e.g. [`HostCall::commit`], [`HostCall::blob_open`]) when
/// starting from raw guest bytes — they validate lengths and report
/// [`HostError::Boundary`] before any engine is reached.
///
/// Operations whose ABI signature returns variable-length data through a
/// register carry the register id; everything else returns its result
/// directly in the [`HostResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    // Raw storage (register-returning, per the ABI)
    StorageRead { key: Vec<u8>, register: u64 },
    StorageWrite { key: Vec<u8>, value: Vec<u8>, register: u64 },
    StorageRemove { key: Vec<u8>, register: u64 },

    // Registers and execution identity
    RegisterLen { register: u64 },
    ReadRegister { register: u64 },
    ContextId { register: u64 },
    ExecutorId { register: u64 },
    Input { register: u64 },

    // CRDT map
    MapNew,
    MapGet { id: Vec<u8>, key: Vec<u8> },
    MapInsert { id: Vec<u8>, key: Vec<u8>, value: Vec<u8> },
    MapRemove { id: Vec<u8>, key: Vec<u8> },
    MapContains { id: Vec<u8>, key: Vec<u8> },
    MapIter { id: Vec<u8> },

    // CRDT vector
    VectorNew,
    VectorLen { id: Vec<u8> },
    VectorPush { id: Vec<u8>, value: Vec<u8> },
    VectorGet { id: Vec<u8>, index: u64 },
    VectorPop { id: Vec<u8> },

    // CRDT set
    SetNew,
    SetInsert { id: Vec<u8>, value: Vec<u8> },
    SetContains { id: Vec<u8>, value: Vec<u8> },
    SetRemove { id: Vec<u8>, value: Vec<u8> },
    SetLen { id: Vec<u8> },
    SetIter { id: Vec<u8> },
    SetClear { id: Vec<u8> },

    // LWW register
    LwwNew,
    LwwSet { id: Vec<u8>, value: Option<Vec<u8>> },
    LwwGet { id: Vec<u8> },
    LwwTimestamp { id: Vec<u8> },

    // Counter
    CounterNew,
    CounterIncrement { id: Vec<u8> },
    CounterValue { id: Vec<u8> },
    CounterExecutorCount { id: Vec<u8>, executor: Option<ExecutorId> },

    // User storage
    UserStorageNew,
    UserStorageInsert { storage: StorageId, value: Vec<u8> },
    UserStorageGet { storage: StorageId },
    UserStorageGetForUser { storage: StorageId, user: ExecutorId },
    UserStorageRemove { storage: StorageId },
    UserStorageContains { storage: StorageId },
    UserStorageContainsUser { storage: StorageId, user: ExecutorId },

    // Frozen storage
    FrozenStorageNew,
    FrozenStorageAdd { storage: StorageId, value: Vec<u8> },
    FrozenStorageGet { storage: StorageId, hash: [u8; 32] },
    FrozenStorageContains { storage: StorageId, hash: [u8; 32] },

    // Delta & root state
    Commit { root_hash: [u8; 32], artifact: Vec<u8> },
    PersistRootState { document: Vec<u8>, created_at: u64, updated_at: u64 },
    ReadRootState,
    ApplyStorageDelta { delta: Vec<u8> },
    FlushDelta,

    // Blobs
    BlobCreate,
    BlobOpen { id: BlobId },
    BlobRead { fd: u64, len: u64 },
    BlobWrite { fd: u64, data: Vec<u8> },
    BlobClose { fd: u64 },
    BlobAnnounceToContext { blob: BlobId, context: ContextId },

    // Misc
    TimeNow,
    RandomBytes { len: u64 },
    Emit { kind: String, data: Vec<u8> },
    EmitWithHandler { kind: String, data: Vec<u8>, handler: Vec<u8> },
    Ed25519Verify { message: Vec<u8>, signature: Box<[u8; 64]>, public_key: [u8; 32] },
}

/// The typed result of a dispatched [`HostCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostResponse {
    /// The operation has no result beyond success.
    Unit,
    /// A boolean result (presence, success, verification outcome).
    Bool(bool),
    /// A numeric result (length, count, handle, timestamp).
    U64(u64),
    /// A numeric result that may be absent.
    OptionalU64(Option<u64>),
    /// A byte-string result.
    Bytes(Vec<u8>),
    /// A byte-string result that may be absent (not-found).
    OptionalBytes(Option<Vec<u8>>),
    /// An ordered enumeration of key-value pairs.
    Entries(Vec<(Vec<u8>, Vec<u8>)>),
    /// The root snapshot, if one is persisted.
    Root(Option<RootState>),
}

fn fixed32(argument: &'static str, bytes: &[u8]) -> HostResult<[u8; 32]> {
    bytes.try_into().map_err(|_| {
        HostError::boundary(
            argument,
            TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            },
        )
    })
}

impl HostCall {
    /// Checked constructor: `user_storage_insert` from raw id bytes.
    pub fn user_storage_insert(storage_id: &[u8], value: &[u8]) -> HostResult<Self> {
        Ok(Self::UserStorageInsert {
            storage: StorageId::try_from_slice(storage_id)
                .map_err(|e| HostError::boundary("storage_id", e))?,
            value: value.to_vec(),
        })
    }

    /// Checked constructor: `user_storage_get` from raw id bytes.
    pub fn user_storage_get(storage_id: &[u8]) -> HostResult<Self> {
        Ok(Self::UserStorageGet {
            storage: StorageId::try_from_slice(storage_id)
                .map_err(|e| HostError::boundary("storage_id", e))?,
        })
    }

    /// Checked constructor: `user_storage_get_for_user` from raw bytes.
    pub fn user_storage_get_for_user(storage_id: &[u8], user_key: &[u8]) -> HostResult<Self> {
        Ok(Self::UserStorageGetForUser {
            storage: StorageId::try_from_slice(storage_id)
                .map_err(|e| HostError::boundary("storage_id", e))?,
            user: ExecutorId::try_from_slice(user_key)
                .map_err(|e| HostError::boundary("user_key", e))?,
        })
    }

    /// Checked constructor: `frozen_storage_add` from raw id bytes.
    pub fn frozen_storage_add(storage_id: &[u8], value: &[u8]) -> HostResult<Self> {
        Ok(Self::FrozenStorageAdd {
            storage: StorageId::try_from_slice(storage_id)
                .map_err(|e| HostError::boundary("storage_id", e))?,
            value: value.to_vec(),
        })
    }

    /// Checked constructor: `frozen_storage_get` from raw bytes.
    pub fn frozen_storage_get(storage_id: &[u8], hash: &[u8]) -> HostResult<Self> {
        Ok(Self::FrozenStorageGet {
            storage: StorageId::try_from_slice(storage_id)
                .map_err(|e| HostError::boundary("storage_id", e))?,
            hash: fixed32("hash", hash)?,
        })
    }

    /// Checked constructor: `frozen_storage_contains` from raw bytes.
    pub fn frozen_storage_contains(storage_id: &[u8], hash: &[u8]) -> HostResult<Self> {
        Ok(Self::FrozenStorageContains {
            storage: StorageId::try_from_slice(storage_id)
                .map_err(|e| HostError::boundary("storage_id", e))?,
            hash: fixed32("hash", hash)?,
        })
    }

    /// Checked constructor: `commit` from raw root-hash bytes.
    pub fn commit(root_hash: &[u8], artifact: &[u8]) -> HostResult<Self> {
        Ok(Self::Commit {
            root_hash: fixed32("root_hash", root_hash)?,
            artifact: artifact.to_vec(),
        })
    }

    /// Checked constructor: `blob_open` from raw id bytes.
    pub fn blob_open(blob_id: &[u8]) -> HostResult<Self> {
        Ok(Self::BlobOpen {
            id: BlobId::try_from_slice(blob_id).map_err(|e| HostError::boundary("blob_id", e))?,
        })
    }

    /// Checked constructor: `blob_announce_to_context` from raw bytes.
    pub fn blob_announce_to_context(blob_id: &[u8], context_id: &[u8]) -> HostResult<Self> {
        Ok(Self::BlobAnnounceToContext {
            blob: BlobId::try_from_slice(blob_id).map_err(|e| HostError::boundary("blob_id", e))?,
            context: ContextId::try_from_slice(context_id)
                .map_err(|e| HostError::boundary("context_id", e))?,
        })
    }

    /// Checked constructor: `counter_get_executor_count` from raw bytes.
    ///
    /// `executor = None` maps to the ABI's `has_executor = false` case and
    /// yields the counter's global value.
    pub fn counter_executor_count(id: &[u8], executor: Option<&[u8]>) -> HostResult<Self> {
        let executor = executor
            .map(|bytes| {
                ExecutorId::try_from_slice(bytes).map_err(|e| HostError::boundary("executor", e))
            })
            .transpose()?;
        Ok(Self::CounterExecutorCount {
            id: id.to_vec(),
            executor,
        })
    }

    /// Checked constructor: `ed25519_verify` from raw component bytes.
    pub fn ed25519_verify(message: &[u8], signature: &[u8], public_key: &[u8]) -> HostResult<Self> {
        let signature: [u8; 64] = signature.try_into().map_err(|_| {
            HostError::boundary(
                "signature",
                TypeError::InvalidLength {
                    expected: 64,
                    actual: signature.len(),
                },
            )
        })?;
        Ok(Self::Ed25519Verify {
            message: message.to_vec(),
            signature: Box::new(signature),
            public_key: fixed32("public_key", public_key)?,
        })
    }
}

impl<S: KvStore> Runtime<S> {
    /// Dispatch one typed host call.
    pub fn call(&self, call: HostCall) -> HostResult<HostResponse> {
        use HostCall as C;
        use HostResponse as R;

        Ok(match call {
            // Raw storage: value traffic goes through the named register.
            C::StorageRead { key, register } => {
                match self.storage_read(&key)? {
                    Some(value) => {
                        self.registers().set(register, value);
                        R::Bool(true)
                    }
                    None => R::Bool(false),
                }
            }
            C::StorageWrite { key, value, register } => {
                match self.storage_write(&key, &value)? {
                    Some(previous) => {
                        self.registers().set(register, previous);
                        R::Bool(true)
                    }
                    None => R::Bool(false),
                }
            }
            C::StorageRemove { key, register } => {
                match self.storage_remove(&key)? {
                    Some(previous) => {
                        self.registers().set(register, previous);
                        R::Bool(true)
                    }
                    None => R::Bool(false),
                }
            }

            C::RegisterLen { register } => R::OptionalU64(self.registers().len(register)),
            C::ReadRegister { register } => R::OptionalBytes(self.registers().take(register)),
            C::ContextId { register } => {
                self.registers().set(register, self.context_id().as_bytes().to_vec());
                R::Unit
            }
            C::ExecutorId { register } => {
                self.registers().set(register, self.executor_id().as_bytes().to_vec());
                R::Unit
            }
            C::Input { register } => {
                self.registers().set(register, self.input().to_vec());
                R::Unit
            }

            C::MapNew => R::Bytes(self.map_new()),
            C::MapGet { id, key } => R::OptionalBytes(self.map_get(&id, &key)?),
            C::MapInsert { id, key, value } => {
                R::OptionalBytes(self.map_insert(&id, &key, &value)?)
            }
            C::MapRemove { id, key } => R::OptionalBytes(self.map_remove(&id, &key)?),
            C::MapContains { id, key } => R::Bool(self.map_contains(&id, &key)?),
            C::MapIter { id } => R::Entries(self.map_entries(&id)?),

            C::VectorNew => R::Bytes(self.vector_new()),
            C::VectorLen { id } => R::U64(self.vector_len(&id)?),
            C::VectorPush { id, value } => R::U64(self.vector_push(&id, &value)?),
            C::VectorGet { id, index } => R::OptionalBytes(self.vector_get(&id, index)?),
            C::VectorPop { id } => R::OptionalBytes(self.vector_pop(&id)?),

            C::SetNew => R::Bytes(self.set_new()),
            C::SetInsert { id, value } => R::Bool(self.set_insert(&id, &value)?),
            C::SetContains { id, value } => R::Bool(self.set_contains(&id, &value)?),
            C::SetRemove { id, value } => R::Bool(self.set_remove(&id, &value)?),
            C::SetLen { id } => R::U64(self.set_len(&id)?),
            C::SetIter { id } => R::Entries(
                self.set_members(&id)?
                    .into_iter()
                    .map(|member| (member, Vec::new()))
                    .collect(),
            ),
            C::SetClear { id } => R::U64(self.set_clear(&id)?),

            C::LwwNew => R::Bytes(self.lww_new()),
            C::LwwSet { id, value } => R::Bool(self.lww_set(&id, value.as_deref())?),
            C::LwwGet { id } => R::OptionalBytes(self.lww_get(&id)?),
            C::LwwTimestamp { id } => R::OptionalU64(self.lww_timestamp(&id)?),

            C::CounterNew => R::Bytes(self.counter_new()),
            C::CounterIncrement { id } => R::U64(self.counter_increment(&id)?),
            C::CounterValue { id } => R::U64(self.counter_value(&id)?),
            C::CounterExecutorCount { id, executor } => {
                R::U64(self.counter_executor_count(&id, executor.as_ref())?)
            }

            C::UserStorageNew => R::Bytes(self.user_storage_new().as_bytes().to_vec()),
            C::UserStorageInsert { storage, value } => R::Bytes(
                self.user_storage_insert(&storage, &value)?
                    .as_bytes()
                    .to_vec(),
            ),
            C::UserStorageGet { storage } => R::OptionalBytes(self.user_storage_get(&storage)?),
            C::UserStorageGetForUser { storage, user } => {
                R::OptionalBytes(self.user_storage_get_for_user(&storage, &user)?)
            }
            C::UserStorageRemove { storage } => R::Bool(self.user_storage_remove(&storage)?),
            C::UserStorageContains { storage } => R::Bool(self.user_storage_contains(&storage)?),
            C::UserStorageContainsUser { storage, user } => {
                R::Bool(self.user_storage_contains_user(&storage, &user)?)
            }

            C::FrozenStorageNew => R::Bytes(self.frozen_storage_new().as_bytes().to_vec()),
            C::FrozenStorageAdd { storage, value } => {
                R::Bytes(self.frozen_storage_add(&storage, &value)?.to_vec())
            }
            C::FrozenStorageGet { storage, hash } => {
                R::OptionalBytes(self.frozen_storage_get(&storage, &hash)?)
            }
            C::FrozenStorageContains { storage, hash } => {
                R::Bool(self.frozen_storage_contains(&storage, &hash)?)
            }

            C::Commit { root_hash, artifact } => {
                self.commit(&root_hash, &artifact)?;
                R::Unit
            }
            C::PersistRootState { document, created_at, updated_at } => {
                self.persist_root_state(&document, created_at, updated_at)?;
                R::Unit
            }
            C::ReadRootState => R::Root(self.read_root_state()?),
            C::ApplyStorageDelta { delta } => R::U64(self.apply_storage_delta(&delta)?),
            C::FlushDelta => R::OptionalBytes(self.flush_delta()?),

            C::BlobCreate => R::U64(self.blob_create()),
            C::BlobOpen { id } => R::OptionalU64(self.blob_open(&id)),
            C::BlobRead { fd, len } => R::Bytes(self.blob_read(fd, len as usize)?),
            C::BlobWrite { fd, data } => R::U64(self.blob_write(fd, &data)?),
            C::BlobClose { fd } => R::Bytes(self.blob_close(fd)?.as_bytes().to_vec()),
            C::BlobAnnounceToContext { blob, context } => {
                R::Bool(self.blob_announce_to_context(&blob, &context))
            }

            C::TimeNow => R::U64(self.time_now()),
            C::RandomBytes { len } => R::Bytes(self.random_bytes(len as usize)),
            C::Emit { kind, data } => {
                self.emit(&kind, &data);
                R::Unit
            }
            C::EmitWithHandler { kind, data, handler } => {
                self.emit_with_handler(&kind, &data, &handler);
                R::Unit
            }
            C::Ed25519Verify { message, signature, public_key } => {
                R::Bool(self.ed25519_verify(&message, signature.as_ref(), &public_key)?)
            }
        })
    }
}
