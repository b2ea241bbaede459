use weft_kv::KvStore;
use weft_types::keyspace::{self, TAG_VECTOR};

use crate::error::{CrdtError, CrdtResult};

/// Element field marker: `0x00 ++ u64-be index`.
const FIELD_ELEMENT: u8 = 0x00;
/// Length field marker, value stored as u64-le.
const FIELD_LEN: u8 = 0x01;

/// Index-addressed replicated sequence with tail push/pop.
///
/// Elements live at `[TAG_VECTOR][id][0x00][u64-be index]`; the big-endian
/// index keeps element keys in positional order under byte-order scans.
/// The length is its own field so `len` is a point read.
pub struct CrdtVector<'s> {
    store: &'s dyn KvStore,
    id: Vec<u8>,
}

impl<'s> CrdtVector<'s> {
    /// Attach to the vector entity `id` in `store`.
    pub fn open(store: &'s dyn KvStore, id: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            id: id.into(),
        }
    }

    /// The entity id of this vector.
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Number of elements (committed + pending within this execution).
    pub fn len(&self) -> CrdtResult<u64> {
        match self.store.get(&self.len_key())? {
            Some(bytes) => self.decode_len(&bytes),
            None => Ok(0),
        }
    }

    /// Returns `true` if the vector has no elements.
    pub fn is_empty(&self) -> CrdtResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Append a value at the tail. Returns the new length.
    pub fn push(&self, value: &[u8]) -> CrdtResult<u64> {
        let len = self.len()?;
        self.store.put(&self.element_key(len), value)?;
        self.store.put(&self.len_key(), &(len + 1).to_le_bytes())?;
        Ok(len + 1)
    }

    /// Remove and return the tail element, or `None` when empty.
    pub fn pop(&self) -> CrdtResult<Option<Vec<u8>>> {
        let len = self.len()?;
        if len == 0 {
            return Ok(None);
        }
        let key = self.element_key(len - 1);
        let value = self.store.get(&key)?;
        self.store.delete(&key)?;
        self.store.put(&self.len_key(), &(len - 1).to_le_bytes())?;
        Ok(value)
    }

    /// Read the element at `index`. Out-of-range is `None`, never a fault.
    pub fn get(&self, index: u64) -> CrdtResult<Option<Vec<u8>>> {
        if index >= self.len()? {
            return Ok(None);
        }
        Ok(self.store.get(&self.element_key(index))?)
    }

    fn len_key(&self) -> Vec<u8> {
        keyspace::entity_key(TAG_VECTOR, &self.id, &[FIELD_LEN])
    }

    fn element_key(&self, index: u64) -> Vec<u8> {
        let mut field = Vec::with_capacity(9);
        field.push(FIELD_ELEMENT);
        field.extend_from_slice(&index.to_be_bytes());
        keyspace::entity_key(TAG_VECTOR, &self.id, &field)
    }

    fn decode_len(&self, bytes: &[u8]) -> CrdtResult<u64> {
        let arr: [u8; 8] = bytes.try_into().map_err(|_| CrdtError::CorruptRecord {
            entity: hex_id(&self.id),
            reason: format!("length field is {} bytes, expected 8", bytes.len()),
        })?;
        Ok(u64::from_le_bytes(arr))
    }
}

fn hex_id(id: &[u8]) -> String {
    id.iter().map(|b| format!("{b:02x}")).collect()
}
