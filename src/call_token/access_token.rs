//! RTC access tokens in the provider's "006" layout.
//!
//! `"006" + app_id + base64(content)` where
//! `content = bytes(signature) | u32 crc32(channel) | u32 crc32(uid) | bytes(message)`
//! and `message = u32 salt | u32 ts | map<u16, u32> privileges`.
//! Integers are little-endian, `bytes` carries a u16 length prefix.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const VERSION: &str = "006";

/// Lifetime of the token envelope itself, independent of privilege expiry
const MESSAGE_TTL_SECONDS: u32 = 24 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum Privilege {
    JoinChannel = 1,
    PublishAudioStream = 2,
    PublishVideoStream = 3,
    PublishDataStream = 4,
}

/// Signed token under construction
pub struct AccessToken<'a> {
    app_id: &'a str,
    app_certificate: &'a str,
    channel_name: &'a str,
    uid: String,
    salt: u32,
    ts: u32,
    privileges: BTreeMap<u16, u32>,
}

impl<'a> AccessToken<'a> {
    /// `uid == 0` signs for "any uid", encoded as the empty string.
    pub fn new(
        app_id: &'a str,
        app_certificate: &'a str,
        channel_name: &'a str,
        uid: u32,
        now: u32,
    ) -> Self {
        let uid = if uid == 0 { String::new() } else { uid.to_string() };
        Self {
            app_id,
            app_certificate,
            channel_name,
            uid,
            salt: rand::rng().random_range(1..=99_999_999),
            ts: now.saturating_add(MESSAGE_TTL_SECONDS),
            privileges: BTreeMap::new(),
        }
    }

    pub fn add_privilege(&mut self, privilege: Privilege, expire_ts: u32) {
        self.privileges.insert(privilege as u16, expire_ts);
    }

    pub fn build(&self) -> Result<String> {
        let message = self.pack_message()?;

        let mut mac = HmacSha256::new_from_slice(self.app_certificate.as_bytes())
            .map_err(|e| AppError::InternalError(format!("Invalid app certificate: {}", e)))?;
        mac.update(self.app_id.as_bytes());
        mac.update(self.channel_name.as_bytes());
        mac.update(self.uid.as_bytes());
        mac.update(&message);
        let signature = mac.finalize().into_bytes();

        let mut content = Vec::with_capacity(signature.len() + message.len() + 12);
        pack_bytes(&mut content, &signature)?;
        content.extend_from_slice(&crc32fast::hash(self.channel_name.as_bytes()).to_le_bytes());
        content.extend_from_slice(&crc32fast::hash(self.uid.as_bytes()).to_le_bytes());
        pack_bytes(&mut content, &message)?;

        Ok(format!("{}{}{}", VERSION, self.app_id, STANDARD.encode(content)))
    }

    fn pack_message(&self) -> Result<Vec<u8>> {
        let mut message = Vec::with_capacity(10 + self.privileges.len() * 6);
        message.extend_from_slice(&self.salt.to_le_bytes());
        message.extend_from_slice(&self.ts.to_le_bytes());
        message.extend_from_slice(&packed_len(self.privileges.len())?.to_le_bytes());
        for (key, value) in &self.privileges {
            message.extend_from_slice(&key.to_le_bytes());
            message.extend_from_slice(&value.to_le_bytes());
        }
        Ok(message)
    }
}

fn pack_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    buf.extend_from_slice(&packed_len(bytes.len())?.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

fn packed_len(len: usize) -> Result<u16> {
    u16::try_from(len)
        .map_err(|_| AppError::InternalError(format!("Token field too long: {} bytes", len)))
}
