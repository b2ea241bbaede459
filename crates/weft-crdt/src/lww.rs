use serde::{Deserialize, Serialize};
use weft_kv::KvStore;
use weft_types::keyspace::{self, TAG_LWW};
use weft_types::ExecutorId;

use crate::error::{CrdtError, CrdtResult};

/// The stored state of a last-writer-wins register.
///
/// Ordering between records is `(timestamp_ns, writer)`: a higher timestamp
/// wins outright, and an identical timestamp is broken by the
/// lexicographically greater writer id. This rule is a frozen wire-level
/// contract — replicas replaying the same operations must agree on the
/// winner byte-for-byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwRecord {
    /// The register value; `None` when the winning write cleared it.
    pub value: Option<Vec<u8>>,
    /// Write timestamp, nanoseconds since the UNIX epoch.
    pub timestamp_ns: u64,
    /// The executor that performed the write.
    pub writer: ExecutorId,
}

impl LwwRecord {
    /// Returns `true` if this record beats `other` under the LWW order.
    pub fn wins_over(&self, other: &Self) -> bool {
        (self.timestamp_ns, &self.writer) > (other.timestamp_ns, &other.writer)
    }

    /// Decode a stored record.
    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    /// Encode for storage.
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }
}

/// Last-writer-wins register.
///
/// `get` and `timestamp` are separate reads so callers can inspect
/// provenance without materializing the value.
pub struct LwwRegister<'s> {
    store: &'s dyn KvStore,
    id: Vec<u8>,
}

impl<'s> LwwRegister<'s> {
    /// Attach to the register entity `id` in `store`.
    pub fn open(store: &'s dyn KvStore, id: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            id: id.into(),
        }
    }

    /// The entity id of this register.
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Write `value` stamped `(timestamp_ns, writer)`.
    ///
    /// The write lands only if it beats the stored record under the LWW
    /// order; a losing write leaves state untouched. Returns `true` if
    /// this write won. `value = None` records an explicit clear — it
    /// competes like any other write.
    pub fn set(
        &self,
        value: Option<&[u8]>,
        timestamp_ns: u64,
        writer: &ExecutorId,
    ) -> CrdtResult<bool> {
        let candidate = LwwRecord {
            value: value.map(|v| v.to_vec()),
            timestamp_ns,
            writer: *writer,
        };
        if let Some(current) = self.record()? {
            if !candidate.wins_over(&current) {
                return Ok(false);
            }
        }
        let bytes = candidate.encode().map_err(|e| self.corrupt(e.to_string()))?;
        self.store.put(&self.key(), &bytes)?;
        Ok(true)
    }

    /// The winning value, or `None` if never set or explicitly cleared.
    pub fn get(&self) -> CrdtResult<Option<Vec<u8>>> {
        Ok(self.record()?.and_then(|r| r.value))
    }

    /// The winning write's timestamp, or `None` if never set.
    pub fn timestamp(&self) -> CrdtResult<Option<u64>> {
        Ok(self.record()?.map(|r| r.timestamp_ns))
    }

    /// The full stored record, provenance included.
    pub fn record(&self) -> CrdtResult<Option<LwwRecord>> {
        match self.store.get(&self.key())? {
            Some(bytes) => {
                let record = LwwRecord::decode(&bytes).map_err(|e| self.corrupt(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn key(&self) -> Vec<u8> {
        keyspace::entity_prefix(TAG_LWW, &self.id)
    }

    fn corrupt(&self, reason: String) -> CrdtError {
        CrdtError::CorruptRecord {
            entity: self.id.iter().map(|b| format!("{b:02x}")).collect(),
            reason,
        }
    }
}
