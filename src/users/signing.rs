use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Keyed, deterministic signer for remember tokens.
#[derive(Clone)]
pub struct RememberSigner {
    mac: HmacSha256,
}

impl RememberSigner {
    pub fn new(key: &str) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
        Ok(Self { mac })
    }

    pub fn sign(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        URL_SAFE.encode(mac.finalize().into_bytes())
    }
}
