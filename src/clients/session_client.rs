use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::api_client::TOKEN_KEY;
use super::order_client::decode;
use super::{ApiClient, ApiError, RequestConfig, SessionError};
use crate::model::{LoginRequest, LoginResponse, UserProfile};
use crate::storage::KeyValueStore;

/// Storage key of the signed-in user's profile.
pub const USER_KEY: &str = "sc_user";

/// Sign-in, sign-out and the stored credential.
#[derive(Clone)]
pub struct SessionClient {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient").field("api", &self.api).finish_non_exhaustive()
    }
}

impl SessionClient {
    pub fn new(api: ApiClient, store: Arc<dyn KeyValueStore>) -> Self {
        Self { api, store }
    }

    /// Signs in and stores the token and profile.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        student_id: &str,
        password: &str,
    ) -> Result<UserProfile, SessionError> {
        if student_id.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation("Student ID and password are required.".into()).into());
        }
        let body = serde_json::to_value(LoginRequest {
            student_id: student_id.trim().to_string(),
            password: password.to_string(),
        })
        .map_err(|e| ApiError::Validation(e.to_string()))?;

        let payload = self.api.send(RequestConfig::post("/login", body)).await?;
        let login: LoginResponse = decode(payload, "login")?;

        let profile = serde_json::to_string(&login.user)
            .map_err(|e| ApiError::UnexpectedPayload(e.to_string()))?;
        self.store.set(TOKEN_KEY, &login.access_token).await?;
        self.store.set(USER_KEY, &profile).await?;

        info!(student_id = %login.user.student_id, "Signed in");
        Ok(login.user)
    }

    /// The stored profile; `None` if absent, unreadable or malformed.
    pub async fn current_user(&self) -> Option<UserProfile> {
        let raw = match self.store.get(USER_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Could not read user profile");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!(error = %e, "Stored user profile is malformed"))
            .ok()
    }

    pub async fn is_signed_in(&self) -> bool {
        matches!(self.store.get(TOKEN_KEY).await, Ok(Some(token)) if !token.is_empty())
    }

    /// Removes the token and the profile. Both deletes are attempted.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), SessionError> {
        let token = self.store.delete(TOKEN_KEY).await;
        let user = self.store.delete(USER_KEY).await;
        token?;
        user?;
        info!("Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, ApiMode};
    use crate::storage::MemoryStore;
    use crate::testing::MockTransport;
    use serde_json::json;

    fn session(mock: &MockTransport, store: &MemoryStore) -> SessionClient {
        let config = ApiConfig {
            mode: ApiMode::Real,
            ..ApiConfig::default()
        };
        let store: Arc<dyn KeyValueStore> = Arc::new(store.clone());
        SessionClient::new(ApiClient::new(&config, Arc::new(mock.clone()), store.clone()), store)
    }

    #[tokio::test]
    async fn test_login_stores_credentials_and_logout_clears_them() {
        let mock = MockTransport::new();
        mock.expect_request().return_ok(json!({
            "access_token": "tok-1",
            "user": { "student_id": "s100", "name": "Ada" },
        }));
        let store = MemoryStore::new();
        let session = session(&mock, &store);

        let user = session.login("s100", "pw").await.unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok-1"));
        assert_eq!(session.current_user().await, Some(user));
        assert!(session.is_signed_in().await);

        session.logout().await.unwrap();
        assert!(!session.is_signed_in().await);
        assert_eq!(session.current_user().await, None);
    }

    #[tokio::test]
    async fn test_rejected_login_stores_nothing() {
        let mock = MockTransport::new();
        mock.expect_request().return_status(401, json!({ "message": "bad password" }));
        let store = MemoryStore::new();
        let session = session(&mock, &store);

        let err = session.login("s100", "wrong").await.unwrap_err();
        assert!(matches!(err, SessionError::Api(ApiError::Unauthorized)));
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_credentials_are_refused_locally() {
        let mock = MockTransport::new();
        let session = session(&mock, &MemoryStore::new());
        let err = session.login("  ", "pw").await.unwrap_err();
        assert!(matches!(err, SessionError::Api(ApiError::Validation(_))));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_profile_reads_as_none() {
        let store = MemoryStore::new();
        store.set(USER_KEY, "{not json").await.unwrap();
        let session = session(&MockTransport::new(), &store);
        assert_eq!(session.current_user().await, None);
    }
}
