use anyhow::Result;
use std::io::Read;

/// Compress bytes using zstd compression
///
/// # Errors
///
/// Returns an error if compression fails
pub fn compress_bytes(data: &[u8], level: i32) -> Result<Vec<u8>> {
    zstd::encode_all(data, level).map_err(Into::into)
}

/// Decompress zstd bytes, refusing to inflate past `limit` bytes
///
/// # Errors
///
/// Returns an error if the stream is not valid zstd or exceeds `limit`
pub fn decompress_bytes_bounded(data: &[u8], limit: u64) -> Result<Vec<u8>> {
    let decoder = zstd::stream::Decoder::new(data)?;
    let mut out = Vec::new();
    decoder.take(limit + 1).read_to_end(&mut out)?;
    if out.len() as u64 > limit {
        anyhow::bail!("decompressed data exceeds {limit} bytes");
    }
    Ok(out)
}
