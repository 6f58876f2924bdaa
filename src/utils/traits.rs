use std::io::{Error, ErrorKind};

use serde::{de::DeserializeOwned, Serialize};

/// Trait for records with a fixed on-disk width
/// # Note
/// Encoding goes through [bincode]'s legacy configuration,
/// which writes integers little-endian at their full width and adds no padding,
/// so the layout does not depend on how the compiler lays out the struct.
pub trait FixedCodec: Serialize + DeserializeOwned {
    /// number of bytes one record occupies on disk
    const ENCODED_SIZE: usize;

    /// encode into the front of `buf`
    /// # Returns
    /// The number of bytes written if successful
    fn encode_into(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        let config = bincode::config::legacy();
        let written = bincode::serde::encode_into_slice(self, buf, config)
            .map_err(|e| Error::new(ErrorKind::InvalidInput, e.to_string()))?;
        if written != Self::ENCODED_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("encoded {written} bytes, expected {}", Self::ENCODED_SIZE),
            ));
        }
        Ok(written)
    }

    /// encode into a fresh [Vec](std::vec::Vec)
    fn encode(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = vec![0u8; Self::ENCODED_SIZE];
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// decode from the front of `buf`
    fn decode_from(buf: &[u8]) -> std::io::Result<Self> {
        let config = bincode::config::legacy();
        let (object, _bytes_read): (Self, usize) =
            bincode::serde::decode_from_slice(buf, config)
                .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
        Ok(object)
    }
}
