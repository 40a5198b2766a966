//! Registration, login and logout.

use super::password::{hash_password, verify_password};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::model::{Credentials, SessionGrant, SessionUser};
use crate::store::{duplicate_username, Store};
use chrono::Utc;
use uuid::Uuid;

pub struct AccountService;

impl AccountService {
    /// Create the user and issue their first session.
    pub async fn register(
        store: &dyn Store,
        config: &AppConfig,
        creds: Credentials,
    ) -> Result<SessionGrant, AppError> {
        if store.find_user_by_username(&creds.username).await?.is_some() {
            return Err(duplicate_username(&creds.username));
        }
        let hash = hash_password(creds.password, config.bcrypt_cost).await?;
        let user_id = store.insert_user(&creds.username, &hash).await?;
        tracing::info!(user_id, username = %creds.username, "user registered");
        Self::issue(store, config, user_id, None).await
    }

    /// Verify credentials and issue a session, discarding `prior` if the caller presented one.
    pub async fn login(
        store: &dyn Store,
        config: &AppConfig,
        creds: Credentials,
        prior: Option<Uuid>,
    ) -> Result<SessionGrant, AppError> {
        let user = store
            .find_user_by_username(&creds.username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Username, {} doesn't exist!", creds.username)))?;
        if !verify_password(creds.password, user.password_hash).await? {
            tracing::warn!(user_id = user.user_id, "login rejected");
            return Err(AppError::Authentication);
        }
        let grant = Self::issue(store, config, user.user_id, prior).await?;
        tracing::info!(user_id = user.user_id, replaced = prior.is_some(), "session issued");
        Ok(grant)
    }

    pub async fn logout(store: &dyn Store, session: &SessionUser) -> Result<(), AppError> {
        if !store.delete_session(session.session_id).await? {
            return Err(AppError::Unauthorized("Session has ended".into()));
        }
        tracing::info!(user_id = session.user_id, "session ended");
        Ok(())
    }

    async fn issue(
        store: &dyn Store,
        config: &AppConfig,
        user_id: i32,
        replaces: Option<Uuid>,
    ) -> Result<SessionGrant, AppError> {
        let ttl = chrono::Duration::from_std(config.session_ttl)
            .map_err(|e| AppError::Internal(format!("session ttl: {}", e)))?;
        let session = store
            .create_session(user_id, replaces, Utc::now() + ttl)
            .await?;
        Ok(SessionGrant {
            user_id,
            token: session.session_id,
            expires_at: session.expires_at,
        })
    }
}
