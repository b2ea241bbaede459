use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use bytes::Bytes;
use slab::Slab;
use tracing::debug;
use weft_crypto::BlobHasher;
use weft_types::{BlobId, ContextId};

use crate::error::{BlobError, BlobResult};

enum OpenBlob {
    /// A blob being written; identity is finalized at close.
    Writer { hasher: BlobHasher, data: Vec<u8> },
    /// A completed blob opened for reading.
    Reader { id: BlobId, data: Bytes, pos: usize },
}

/// In-memory blob store with streaming handles.
///
/// Completed blobs are deduplicated by content id. Contexts must be
/// registered before blobs can be announced to them; announcing an unknown
/// blob or an unregistered context reports `false` rather than failing.
pub struct BlobStore {
    blobs: RwLock<HashMap<BlobId, Bytes>>,
    contexts: RwLock<HashSet<ContextId>>,
    announcements: RwLock<HashMap<ContextId, HashSet<BlobId>>>,
    handles: Mutex<Slab<OpenBlob>>,
}

impl BlobStore {
    /// Create an empty blob store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            contexts: RwLock::new(HashSet::new()),
            announcements: RwLock::new(HashMap::new()),
            handles: Mutex::new(Slab::new()),
        }
    }

    /// Open a write handle for a new blob.
    pub fn create(&self) -> u64 {
        let mut handles = self.handles.lock().expect("lock poisoned");
        let key = handles.insert(OpenBlob::Writer {
            hasher: BlobHasher::new(),
            data: Vec::new(),
        });
        to_fd(key)
    }

    /// Open a read handle on a completed blob. `None` if the id is unknown.
    pub fn open(&self, id: &BlobId) -> Option<u64> {
        let data = self.blobs.read().expect("lock poisoned").get(id).cloned()?;
        let mut handles = self.handles.lock().expect("lock poisoned");
        let key = handles.insert(OpenBlob::Reader {
            id: *id,
            data,
            pos: 0,
        });
        Some(to_fd(key))
    }

    /// Append `data` to a write handle. Returns the number of bytes written.
    pub fn write(&self, fd: u64, data: &[u8]) -> BlobResult<u64> {
        let mut handles = self.handles.lock().expect("lock poisoned");
        match handles.get_mut(from_fd(fd)?) {
            Some(OpenBlob::Writer { hasher, data: buf }) => {
                hasher.update(data);
                buf.extend_from_slice(data);
                Ok(data.len() as u64)
            }
            Some(OpenBlob::Reader { .. }) => Err(BlobError::NotWritable(fd)),
            None => Err(BlobError::UnknownHandle(fd)),
        }
    }

    /// Read from a read handle into `buf`. Returns the number of bytes
    /// read; 0 signals end of blob.
    pub fn read(&self, fd: u64, buf: &mut [u8]) -> BlobResult<u64> {
        let mut handles = self.handles.lock().expect("lock poisoned");
        match handles.get_mut(from_fd(fd)?) {
            Some(OpenBlob::Reader { data, pos, .. }) => {
                let remaining = &data[*pos..];
                let n = remaining.len().min(buf.len());
                buf[..n].copy_from_slice(&remaining[..n]);
                *pos += n;
                Ok(n as u64)
            }
            Some(OpenBlob::Writer { .. }) => Err(BlobError::NotReadable(fd)),
            None => Err(BlobError::UnknownHandle(fd)),
        }
    }

    /// Close a handle, releasing it.
    ///
    /// For a write handle this finalizes the content identity and stores
    /// the blob (deduplicated by id). For a read handle it returns the id
    /// the handle was opened with.
    pub fn close(&self, fd: u64) -> BlobResult<BlobId> {
        let mut handles = self.handles.lock().expect("lock poisoned");
        let key = from_fd(fd)?;
        if !handles.contains(key) {
            return Err(BlobError::UnknownHandle(fd));
        }
        match handles.remove(key) {
            OpenBlob::Writer { hasher, data } => {
                let id = hasher.finalize();
                let size = data.len();
                self.blobs
                    .write()
                    .expect("lock poisoned")
                    .entry(id)
                    .or_insert_with(|| Bytes::from(data));
                debug!(blob = %id.short_hex(), size, "blob finalized");
                Ok(id)
            }
            OpenBlob::Reader { id, .. } => Ok(id),
        }
    }

    /// Register a context as a valid announcement target.
    pub fn register_context(&self, context: ContextId) {
        self.contexts.write().expect("lock poisoned").insert(context);
    }

    /// Announce a completed blob's availability to a replication scope.
    ///
    /// Returns `false` if the blob or the context is unknown.
    pub fn announce_to_context(&self, blob: &BlobId, context: &ContextId) -> bool {
        if !self.blobs.read().expect("lock poisoned").contains_key(blob) {
            return false;
        }
        if !self.contexts.read().expect("lock poisoned").contains(context) {
            return false;
        }
        self.announcements
            .write()
            .expect("lock poisoned")
            .entry(*context)
            .or_default()
            .insert(*blob);
        debug!(blob = %blob.short_hex(), context = %context.short_hex(), "blob announced");
        true
    }

    /// Whether a completed blob with this id exists.
    pub fn contains(&self, id: &BlobId) -> bool {
        self.blobs.read().expect("lock poisoned").contains_key(id)
    }

    /// Blobs announced to `context`, in unspecified order.
    pub fn announced_to(&self, context: &ContextId) -> Vec<BlobId> {
        self.announcements
            .read()
            .expect("lock poisoned")
            .get(context)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of currently open handles.
    pub fn open_handles(&self) -> usize {
        self.handles.lock().expect("lock poisoned").len()
    }

    /// Number of completed blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no completed blobs exist.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }
}

impl Default for BlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("blob_count", &self.len())
            .field("open_handles", &self.open_handles())
            .finish()
    }
}

/// Slab keys are 0-based; fd 0 is the ABI's invalid handle.
fn to_fd(key: usize) -> u64 {
    key as u64 + 1
}

fn from_fd(fd: u64) -> BlobResult<usize> {
    if fd == 0 {
        return Err(BlobError::UnknownHandle(0));
    }
    Ok((fd - 1) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_crypto::ContentHasher;

    fn context(byte: u8) -> ContextId {
        ContextId::from_array([byte; 32])
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    #[test]
    fn write_close_read_roundtrip() {
        let store = BlobStore::new();
        let fd = store.create();
        assert_eq!(store.write(fd, b"hello ").unwrap(), 6);
        assert_eq!(store.write(fd, b"world").unwrap(), 5);
        let id = store.close(fd).unwrap();
        assert!(store.contains(&id));

        let rfd = store.open(&id).unwrap();
        let mut buf = [0u8; 64];
        let n = store.read(rfd, &mut buf).unwrap() as usize;
        assert_eq!(&buf[..n], b"hello world");
        assert_eq!(store.read(rfd, &mut buf).unwrap(), 0);
        assert_eq!(store.close(rfd).unwrap(), id);
    }

    #[test]
    fn id_is_independent_of_chunking() {
        let store = BlobStore::new();
        let fd1 = store.create();
        store.write(fd1, b"abcdef").unwrap();
        let id1 = store.close(fd1).unwrap();

        let fd2 = store.create();
        store.write(fd2, b"ab").unwrap();
        store.write(fd2, b"cd").unwrap();
        store.write(fd2, b"ef").unwrap();
        let id2 = store.close(fd2).unwrap();

        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
        assert_eq!(*id1.as_bytes(), ContentHasher::BLOB.hash(b"abcdef"));
    }

    #[test]
    fn empty_blob_has_an_identity() {
        let store = BlobStore::new();
        let fd = store.create();
        let id = store.close(fd).unwrap();
        assert!(store.contains(&id));

        let rfd = store.open(&id).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(store.read(rfd, &mut buf).unwrap(), 0);
        store.close(rfd).unwrap();
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    #[test]
    fn read_in_small_chunks() {
        let store = BlobStore::new();
        let fd = store.create();
        store.write(fd, b"0123456789").unwrap();
        let id = store.close(fd).unwrap();

        let rfd = store.open(&id).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 3];
        loop {
            let n = store.read(rfd, &mut buf).unwrap() as usize;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"0123456789");
        store.close(rfd).unwrap();
    }

    #[test]
    fn open_unknown_blob_is_none() {
        let store = BlobStore::new();
        assert_eq!(store.open(&BlobId::from_array([9u8; 32])), None);
    }

    // -----------------------------------------------------------------------
    // Handle discipline
    // -----------------------------------------------------------------------

    #[test]
    fn fd_zero_is_never_issued_and_always_invalid() {
        let store = BlobStore::new();
        let fd = store.create();
        assert_ne!(fd, 0);
        assert_eq!(store.close(0).unwrap_err(), BlobError::UnknownHandle(0));
        store.close(fd).unwrap();
    }

    #[test]
    fn closed_handle_is_released() {
        let store = BlobStore::new();
        let fd = store.create();
        assert_eq!(store.open_handles(), 1);
        store.close(fd).unwrap();
        assert_eq!(store.open_handles(), 0);
        assert_eq!(store.write(fd, b"x").unwrap_err(), BlobError::UnknownHandle(fd));
        assert_eq!(store.close(fd).unwrap_err(), BlobError::UnknownHandle(fd));
    }

    #[test]
    fn mode_violations_are_typed_errors() {
        let store = BlobStore::new();
        let wfd = store.create();
        let mut buf = [0u8; 4];
        assert_eq!(store.read(wfd, &mut buf).unwrap_err(), BlobError::NotReadable(wfd));
        let id = store.close(wfd).unwrap();

        let rfd = store.open(&id).unwrap();
        assert_eq!(store.write(rfd, b"x").unwrap_err(), BlobError::NotWritable(rfd));
        store.close(rfd).unwrap();
    }

    #[test]
    fn concurrent_handles_are_independent() {
        let store = BlobStore::new();
        let fd1 = store.create();
        let fd2 = store.create();
        store.write(fd1, b"one").unwrap();
        store.write(fd2, b"two").unwrap();
        let id1 = store.close(fd1).unwrap();
        let id2 = store.close(fd2).unwrap();
        assert_ne!(id1, id2);
        assert_eq!(store.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Announcements
    // -----------------------------------------------------------------------

    #[test]
    fn announce_requires_known_blob_and_context() {
        let store = BlobStore::new();
        let ctx = context(1);
        let fd = store.create();
        store.write(fd, b"data").unwrap();
        let id = store.close(fd).unwrap();

        // Context not registered yet.
        assert!(!store.announce_to_context(&id, &ctx));
        store.register_context(ctx);
        // Unknown blob.
        assert!(!store.announce_to_context(&BlobId::from_array([9u8; 32]), &ctx));
        // Both known.
        assert!(store.announce_to_context(&id, &ctx));
        assert_eq!(store.announced_to(&ctx), vec![id]);
    }

    #[test]
    fn announce_is_idempotent() {
        let store = BlobStore::new();
        let ctx = context(1);
        store.register_context(ctx);
        let fd = store.create();
        let id = store.close(fd).unwrap();
        assert!(store.announce_to_context(&id, &ctx));
        assert!(store.announce_to_context(&id, &ctx));
        assert_eq!(store.announced_to(&ctx).len(), 1);
    }
}
