use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::{rngs::OsRng, RngCore};

use crate::users::errors::UserError;

pub const REMEMBER_TOKEN_BYTES: usize = 32;

/// `n` bytes from the OS random source.
pub fn bytes(n: usize) -> Result<Vec<u8>, UserError> {
    let mut buf = vec![0u8; n];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(UserError::RandomSourceExhausted)?;
    Ok(buf)
}

/// `n` random bytes, URL-safe base64 encoded.
pub fn string(n: usize) -> Result<String, UserError> {
    Ok(URL_SAFE.encode(bytes(n)?))
}

pub fn remember_token() -> Result<String, UserError> {
    string(REMEMBER_TOKEN_BYTES)
}
