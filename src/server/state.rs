use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;
use crate::quote::FullQuoteStore;
use crate::user::{TokenService, UserStore};

pub type GuardedUserStore = Arc<dyn UserStore>;
pub type GuardedQuoteStore = Arc<dyn FullQuoteStore>;
pub type GuardedTokenService = Arc<TokenService>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub user_store: GuardedUserStore,
    pub quote_store: GuardedQuoteStore,
    pub token_service: GuardedTokenService,
}

impl FromRef<ServerState> for GuardedUserStore {
    fn from_ref(input: &ServerState) -> Self {
        input.user_store.clone()
    }
}

impl FromRef<ServerState> for GuardedQuoteStore {
    fn from_ref(input: &ServerState) -> Self {
        input.quote_store.clone()
    }
}

impl FromRef<ServerState> for GuardedTokenService {
    fn from_ref(input: &ServerState) -> Self {
        input.token_service.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
