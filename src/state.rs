// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{SessionManager, TokenIssuer};
use crate::config::{ConfigError, SessionSettings, TokenSettings};
use crate::store::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenIssuer>,
    pub sessions: SessionManager,
}

impl AppState {
    /// Build the shared state. Fails if the signing secret is empty.
    pub fn new(
        users: Arc<dyn UserStore>,
        token: &TokenSettings,
        session: SessionSettings,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            users,
            tokens: Arc::new(TokenIssuer::new(token)?),
            sessions: SessionManager::new(&token.secret, session)?,
        })
    }
}
