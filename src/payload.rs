use anyhow::{Context, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

/// Load the blob from `file`, or generate `size` random bytes when no file is given.
pub fn load(file: Option<&Path>, size: usize) -> Result<Arc<[u8]>> {
    let bytes = match file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("reading payload from {}", path.display()))?,
        None => {
            let mut bytes = vec![0u8; size];
            rand::thread_rng().fill_bytes(&mut bytes);
            bytes
        }
    };
    Ok(bytes.into())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
