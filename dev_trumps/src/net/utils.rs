use bincode::config;
use serde::{Serialize, de::DeserializeOwned};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::errors::{Result, SerializationError};

/// Maximum allowed message size (1MB) to prevent DoS attacks via unbounded allocation
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Encode a value with the standard bincode config.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let serialized = bincode::serde::encode_to_vec(value, config::standard())?;
    if serialized.len() > MAX_MESSAGE_SIZE {
        return Err(SerializationError::MessageTooLarge {
            actual: serialized.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(serialized)
}

/// Decode a value encoded by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, config::standard())?;
    Ok(value)
}

fn invalid_data(error: SerializationError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, error)
}

pub async fn read_prefixed<T: DeserializeOwned, R: AsyncRead + Unpin>(
    reader: &mut R,
) -> io::Result<T> {
    // Read the size as a u32
    let mut len_bytes = [0; 4];
    reader.read_exact(&mut len_bytes).await?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    // Validate message size before allocating for it
    if len > MAX_MESSAGE_SIZE {
        return Err(invalid_data(SerializationError::MessageTooLarge {
            actual: len,
            max: MAX_MESSAGE_SIZE,
        }));
    }

    let mut buf = vec![0; len];
    reader.read_exact(&mut buf).await?;
    decode(&buf).map_err(invalid_data)
}

pub async fn write_prefixed<T: Serialize, W: AsyncWrite + Unpin>(
    writer: &mut W,
    value: &T,
) -> io::Result<()> {
    let serialized = encode(value).map_err(invalid_data)?;

    // Write the size of the serialized data and the serialized data
    // all in one chunk to prevent read-side EOF race conditions.
    let size = serialized.len() as u32;
    let mut buf = Vec::from(size.to_le_bytes());
    buf.extend(serialized);
    writer.write_all(&buf).await?;
    writer.flush().await
}
