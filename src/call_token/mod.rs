pub mod access_token;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};
use access_token::{AccessToken, Privilege};

/// Participant ids handed out with call tokens
pub const UID_RANGE: std::ops::RangeInclusive<u32> = 1..=230;

/// Role requested for the call session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallRole {
    #[default]
    Publisher,
    Subscriber,
}

/// Token plus the participant id it was signed for
#[derive(Debug, Clone, Serialize)]
pub struct CallToken {
    pub token: String,
    pub uid: u32,
}

/// Issues stateless RTC join tokens
#[derive(Clone)]
pub struct CallTokenIssuer {
    app_id: String,
    app_certificate: String,
    ttl_seconds: u64,
}

impl CallTokenIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            app_id: config.agora_app_id.clone(),
            app_certificate: config.agora_app_certificate.clone(),
            ttl_seconds: config.call_token_ttl_seconds,
        }
    }

    /// Issue a token for `channel_name` under a random participant id.
    /// The id is not checked against other participants of the channel.
    pub fn issue(&self, channel_name: &str, role: CallRole) -> Result<CallToken> {
        let uid = rand::rng().random_range(UID_RANGE);
        let token = self.build_token(channel_name, uid, role)?;

        tracing::debug!(channel = %channel_name, uid, "Call token issued");
        Ok(CallToken { token, uid })
    }

    fn build_token(&self, channel_name: &str, uid: u32, role: CallRole) -> Result<String> {
        let now = u32::try_from(Utc::now().timestamp())
            .map_err(|_| AppError::InternalError("Clock out of token range".to_string()))?;
        let expire_ts = now.saturating_add(u32::try_from(self.ttl_seconds).unwrap_or(u32::MAX));

        let mut token = AccessToken::new(
            &self.app_id,
            &self.app_certificate,
            channel_name,
            uid,
            now,
        );
        token.add_privilege(Privilege::JoinChannel, expire_ts);
        if role == CallRole::Publisher {
            token.add_privilege(Privilege::PublishAudioStream, expire_ts);
            token.add_privilege(Privilege::PublishVideoStream, expire_ts);
            token.add_privilege(Privilege::PublishDataStream, expire_ts);
        }

        token.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use access_token::tests::{decode, privileges};

    fn test_config() -> Config {
        Config {
            server_host: "localhost".to_string(),
            server_port: 8080,
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            agora_app_id: "test-app-id".to_string(),
            agora_app_certificate: "test-app-certificate".to_string(),
            call_token_ttl_seconds: 3600,
            default_max_members: 10,
            room_code_max_attempts: 32,
            log_format: LogFormat::Pretty,
        }
    }

    #[test]
    fn test_issue_token() {
        let issuer = CallTokenIssuer::new(&test_config());

        let call = issuer
            .issue("ROOM42", CallRole::Publisher)
            .expect("Should issue token");

        assert!(UID_RANGE.contains(&call.uid));
        assert!(call.token.starts_with("006test-app-id"));

        let decoded = decode(&call.token, "test-app-id".len());
        assert_eq!(decoded.crc_channel, crc32fast::hash(b"ROOM42"));
        assert_eq!(decoded.crc_uid, crc32fast::hash(call.uid.to_string().as_bytes()));
    }

    #[test]
    fn test_publisher_privileges_expire_with_ttl() {
        let issuer = CallTokenIssuer::new(&test_config());
        let before = Utc::now().timestamp() as u32;

        let call = issuer.issue("ROOM42", CallRole::Publisher).unwrap();
        let granted = privileges(&decode(&call.token, "test-app-id".len()).message);

        assert_eq!(granted.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        let join_expiry = granted[&1];
        assert!(join_expiry >= before + 3600);
        assert!(join_expiry <= before + 3600 + 5);
    }

    #[test]
    fn test_subscriber_only_joins() {
        let issuer = CallTokenIssuer::new(&test_config());

        let call = issuer.issue("ROOM42", CallRole::Subscriber).unwrap();
        let granted = privileges(&decode(&call.token, "test-app-id".len()).message);

        assert_eq!(granted.keys().copied().collect::<Vec<_>>(), vec![1]);
    }
}
