pub mod account;
pub mod member;
pub mod message;
pub mod room;

use serde::{Deserialize, Deserializer};

pub use account::{
    Account, AccountChanges, AccountListing, ChangePasswordRequest, CreateAccountRequest,
    CreatedAccount, DeleteAccountRequest, NewAccount, UpdateAccountRequest, UpdatedAccount,
};
pub use member::{
    AddMemberRequest, LegacyMemberQuery, LegacyMemberRequest, Member, MemberView,
    RemoveMemberRequest,
};
pub use message::{
    ChatMessage, DeleteMessageRequest, EditMessageRequest, EditedMessage, SendMessageRequest,
    SentMessage,
};
pub use room::{
    CodeQuery, CreateRoomRequest, CreatedRoom, NewRoom, Room, RoomDetails, RoomIdQuery,
    RoomListing, RoomLookup, RoomSummary,
};

/// Front ends send numeric ids both as JSON numbers and as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {}", s))),
    }
}

/// Participant uids arrive as numbers from RTC clients and as strings elsewhere.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<NumberOrString>::deserialize(deserializer)?.map(|value| match value {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::Text(s) => s,
        }),
    )
}

/// Treat absent and empty strings alike, the way form-style clients send them.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_id")]
        id: Option<i64>,
        #[serde(default, deserialize_with = "lenient_string")]
        uid: Option<String>,
    }

    #[test]
    fn test_lenient_fields_accept_numbers_and_strings() {
        let a: Probe = serde_json::from_str(r#"{"id": 7, "uid": 42}"#).unwrap();
        assert_eq!(a.id, Some(7));
        assert_eq!(a.uid.as_deref(), Some("42"));

        let b: Probe = serde_json::from_str(r#"{"id": "7", "uid": "abc"}"#).unwrap();
        assert_eq!(b.id, Some(7));
        assert_eq!(b.uid.as_deref(), Some("abc"));

        let c: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(c.id, None);
        assert_eq!(c.uid, None);
    }

    #[test]
    fn test_lenient_id_rejects_garbage() {
        assert!(serde_json::from_str::<Probe>(r#"{"id": "seven"}"#).is_err());
    }
}
