//! Signed pagination cursors
//!
//! A cursor is `<base64 json>.<base64 hmac-sha256>`; clients cannot forge
//! a position in someone else's listing without the key.

use anyhow::{anyhow, Result};
use base64::prelude::*;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::storage::ListPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorData {
    pub created_at: i64,
    pub id: i64,
}

impl From<CursorData> for ListPosition {
    fn from(data: CursorData) -> Self {
        ListPosition {
            created_at: data.created_at,
            id: data.id,
        }
    }
}

#[derive(Clone)]
pub struct CursorSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for CursorSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorSigner").field("key", &"<redacted>").finish()
    }
}

impl CursorSigner {
    /// Without a secret a random key is used, so cursors do not survive restarts.
    pub fn new(secret: Option<&str>) -> Self {
        let key = match secret {
            Some(s) if !s.is_empty() => s.as_bytes().to_vec(),
            _ => {
                let mut rng = rand::rng();
                (0..32).map(|_| rng.random::<u8>()).collect()
            }
        };
        Self { key }
    }

    fn mac(&self, payload: &str) -> Result<Hmac<Sha256>> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|e| anyhow!("Failed to create HMAC: {}", e))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    pub fn sign(&self, data: &CursorData) -> Result<String> {
        let json = serde_json::to_string(data)?;
        let payload = BASE64_URL_SAFE_NO_PAD.encode(json.as_bytes());
        let signature = self.mac(&payload)?.finalize().into_bytes();
        Ok(format!("{}.{}", payload, BASE64_URL_SAFE_NO_PAD.encode(signature)))
    }

    pub fn verify(&self, cursor: &str) -> Result<CursorData> {
        let (payload, signature_b64) = cursor
            .split_once('.')
            .filter(|(_, sig)| !sig.contains('.'))
            .ok_or_else(|| anyhow!("Invalid cursor format"))?;

        let expected = self.mac(payload)?.finalize().into_bytes();
        let provided = BASE64_URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| anyhow!("Invalid cursor signature encoding"))?;

        if !bool::from(expected.as_slice().ct_eq(&provided)) {
            return Err(anyhow!("Cursor signature verification failed"));
        }

        let json = BASE64_URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| anyhow!("Invalid cursor payload encoding"))?;
        serde_json::from_slice(&json).map_err(|_| anyhow!("Invalid cursor data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> CursorSigner {
        CursorSigner::new(Some("test_secret_key_for_hmac_signing"))
    }

    #[test]
    fn test_cursor_sign_and_verify() {
        let data = CursorData { created_at: 1234567890, id: 42 };
        let cursor = signer().sign(&data).unwrap();
        assert_eq!(signer().verify(&cursor).unwrap(), data);
    }

    #[test]
    fn test_cursor_tampering_detection() {
        let cursor = signer().sign(&CursorData { created_at: 1, id: 2 }).unwrap();
        let (payload, _) = cursor.split_once('.').unwrap();
        assert!(signer().verify(&format!("{}.invalid_signature", payload)).is_err());

        let other = CursorSigner::new(Some("another key"));
        assert!(other.verify(&cursor).is_err());
    }

    #[test]
    fn test_cursor_invalid_format() {
        assert!(signer().verify("invalid").is_err());
        assert!(signer().verify("invalid.format.extra").is_err());
    }
}
