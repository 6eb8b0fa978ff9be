//! Signed user-lifecycle webhooks from the auth provider
//!
//! Clerk delivers events through Svix. The signed content is
//! `{svix-id}.{svix-timestamp}.{raw body}`, HMAC-SHA256 with the decoded
//! `whsec_` secret; `svix-signature` lists one or more `v1,<base64>` values.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::{
    error::{AppError, AppResult},
    models::UserProfile,
};

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";
/// Accepted clock skew between Svix and us, in seconds
const TIMESTAMP_TOLERANCE: u64 = 5 * 60;

/// Values of the three `svix-*` request headers
#[derive(Debug, Clone, Copy)]
pub struct WebhookHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> AppResult<Self> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = STANDARD
            .decode(encoded)
            .map_err(|e| AppError::Internal(format!("Invalid webhook secret: {}", e)))?;
        Ok(Self { key })
    }

    pub fn verify(&self, headers: WebhookHeaders<'_>, payload: &[u8]) -> AppResult<()> {
        self.verify_at(headers, payload, Utc::now().timestamp())
    }

    fn verify_at(&self, headers: WebhookHeaders<'_>, payload: &[u8], now: i64) -> AppResult<()> {
        let timestamp: i64 = headers
            .timestamp
            .parse()
            .map_err(|_| AppError::InvalidWebhook("malformed timestamp".to_string()))?;
        if now.abs_diff(timestamp) > TIMESTAMP_TOLERANCE {
            return Err(AppError::InvalidWebhook(format!(
                "timestamp {} outside tolerance",
                timestamp
            )));
        }

        let mac = self.signed_content_mac(headers.id, headers.timestamp, payload)?;

        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            Err(AppError::InvalidWebhook("no matching signature".to_string()))
        }
    }

    fn signed_content_mac(&self, id: &str, timestamp: &str, payload: &[u8]) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(format!("Invalid webhook key: {}", e)))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }

    /// `v1,<base64>` signature for a payload, as Svix would send it
    pub fn sign(&self, id: &str, timestamp: &str, payload: &[u8]) -> AppResult<String> {
        let mac = self.signed_content_mac(id, timestamp, payload)?;
        Ok(format!(
            "{},{}",
            SIGNATURE_VERSION,
            STANDARD.encode(mac.finalize().into_bytes())
        ))
    }
}

// ============================================================================
// Clerk event payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UserEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: UserEventData,
}

#[derive(Debug, Deserialize)]
pub struct UserEventData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

impl UserEventData {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email_addresses.first().map(|e| e.email_address.clone()),
            username: self.username.clone(),
            name: self.first_name.clone(),
            picture: self.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEventKind {
    Created,
    Updated,
    Other,
}

impl UserEvent {
    pub fn kind(&self) -> UserEventKind {
        match self.event_type.as_str() {
            "user.created" => UserEventKind::Created,
            "user.updated" => UserEventKind::Updated,
            _ => UserEventKind::Other,
        }
    }
}
