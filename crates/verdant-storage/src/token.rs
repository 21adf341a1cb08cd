//! Opaque upload token for the blob upload proxy.
//!
//! Payload: base64url(JSON `{key, mimeType, expiresAt}`), unsigned. The
//! token alone grants nothing: the proxy endpoint re-checks every claim
//! against the pending payload row before accepting bytes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verdant_core::error::AppError;
use verdant_core::result::AppResult;

/// Claims carried by a blob upload token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadToken {
    /// Storage key the upload is destined for.
    pub key: String,
    /// MIME type the client declared when the credential was issued.
    pub mime_type: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl UploadToken {
    /// Build a token for one pending upload.
    pub fn new(key: impl Into<String>, mime_type: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            mime_type: mime_type.into(),
            expires_at,
        }
    }

    /// Serialize to the wire form.
    pub fn encode(&self) -> AppResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Parse the wire form back into claims.
    pub fn decode(raw: &str) -> AppResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|e| AppError::validation(format!("Malformed upload token: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::validation(format!("Malformed upload token: {e}")))
    }

    /// Whether the token's expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_round_trip() {
        let token = UploadToken::new(
            "files/abc/report.pdf",
            "application/pdf",
            Utc::now() + Duration::minutes(15),
        );
        let encoded = token.encode().unwrap();
        let decoded = UploadToken::decode(&encoded).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn test_wire_form_uses_camel_case_keys() {
        let token = UploadToken::new("k", "text/plain", Utc::now() + Duration::minutes(1));
        let encoded = token.encode().unwrap();
        let json = URL_SAFE_NO_PAD.decode(&encoded).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert!(value.get("mimeType").is_some());
        assert!(value.get("expiresAt").is_some());
        assert!(value.get("key").is_some());
    }

    #[test]
    fn test_expired_token_detected() {
        let token = UploadToken::new("k", "text/plain", Utc::now() - Duration::seconds(1));
        assert!(token.is_expired());
    }

    #[test]
    fn test_rejects_garbage_base64() {
        assert!(UploadToken::decode("not!valid!base64!").is_err());
    }

    #[test]
    fn test_rejects_non_json_payload() {
        let raw = URL_SAFE_NO_PAD.encode(b"just some bytes");
        assert!(UploadToken::decode(&raw).is_err());
    }
}
