use std::sync::Arc;

use sqlx::SqlitePool;

use crate::call_token::CallTokenIssuer;
use crate::config::Config;
use crate::db::{AccountRepository, MemberRepository, MessageRepository, RoomRepository};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
    pub rooms: Arc<RoomRepository>,
    pub members: Arc<MemberRepository>,
    pub messages: Arc<MessageRepository>,
    pub accounts: Arc<AccountRepository>,
    pub call_tokens: Arc<CallTokenIssuer>,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let call_tokens = CallTokenIssuer::new(&config);
        let rooms = RoomRepository::new(pool.clone(), config.room_code_max_attempts);

        Self {
            rooms: Arc::new(rooms),
            members: Arc::new(MemberRepository::new(pool.clone())),
            messages: Arc::new(MessageRepository::new(pool.clone())),
            accounts: Arc::new(AccountRepository::new(pool.clone())),
            call_tokens: Arc::new(call_tokens),
            config: Arc::new(config),
            pool,
        }
    }
}
