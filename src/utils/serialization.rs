use anyhow::Result;

/// Upper bound on a decoded catalog; a corrupt length prefix must not make us
/// allocate the machine away.
const DECODE_LIMIT: usize = 512 * 1024 * 1024;

fn get_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<DECODE_LIMIT>()
}

/// Serialize data using bincode with serde
///
/// # Errors
///
/// Returns an error if serialization fails
pub fn serialize<T: serde::Serialize>(data: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(data, get_config()).map_err(Into::into)
}

/// Deserialize data using bincode with serde
///
/// Trailing bytes after a complete value are rejected: a catalog that decodes
/// with leftovers is not the catalog we wrote.
///
/// # Errors
///
/// Returns an error if the data is malformed, truncated or has trailing bytes
pub fn deserialize<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (result, bytes_read) = bincode::serde::decode_from_slice(bytes, get_config())?;
    if bytes_read != bytes.len() {
        anyhow::bail!(
            "{} trailing bytes after decoded value",
            bytes.len() - bytes_read
        );
    }
    Ok(result)
}
