use serde::{de::DeserializeOwned, Serialize};

use crate::fs::Result;

/// Trait for structures persisted with the fixed-width little-endian schema
/// # Note
/// This trait is implemented for all types implementing
/// [Serialize] and [DeserializeOwned] that opt in with an empty `impl`
pub trait SerializeFixed: Serialize + DeserializeOwned {
    /// encode into a [Vec](std::vec::Vec)
    fn encode(&self) -> Result<Vec<u8>> {
        let config = bincode::config::legacy();
        Ok(bincode::serde::encode_to_vec(self, config)?)
    }

    /// decode from a slice, trailing padding is ignored
    /// # Returns
    /// A tuple containing the deserialized object and the number of bytes read
    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let config = bincode::config::legacy();
        Ok(bincode::serde::decode_from_slice(buf, config)?)
    }
}
