use reqwest::{header::CONTENT_TYPE, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    error::{ClientError, CONNECTIVITY_MESSAGE},
    storage::{SessionStore, TOKEN_KEY, USER_KEY},
};

/// Snapshot of the signed-in user, cached for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated { token: String, user: CurrentUser },
}

#[derive(Deserialize)]
struct AuthPayload {
    token: String,
    user: CurrentUser,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client-side session: in-memory state mirrored into injected device storage.
pub struct SessionClient<S> {
    http: reqwest::Client,
    base_url: String,
    storage: S,
    state: SessionState,
}

impl<S: SessionStore> SessionClient<S> {
    /// Starts Unauthenticated; call [`SessionClient::bootstrap`] to restore a
    /// stored session.
    pub fn new(base_url: impl Into<String>, storage: S) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, storage)
    }

    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>, storage: S) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            storage,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { token, .. } => Some(token),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        match &self.state {
            SessionState::Authenticated { user, .. } => Some(user),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Restores the stored session. Missing, unreadable or corrupted entries
    /// leave the client Unauthenticated with storage cleared.
    ///
    /// With `revalidate`, the token is checked against `/api/auth/me`: a 401
    /// ends the session, success refreshes the cached user, and any other
    /// failure keeps the cached session.
    pub async fn bootstrap(&mut self, revalidate: bool) -> &SessionState {
        match self.load_stored() {
            Some((token, user)) => {
                debug!(user_id = %user.id, "restored stored session");
                self.state = SessionState::Authenticated { token, user };
            }
            None => self.clear_session(),
        }

        if revalidate {
            if let Some(token) = self.token().map(str::to_owned) {
                let fetched = self
                    .send::<(), CurrentUser>(Method::GET, "/api/auth/me", None, Some(&token))
                    .await;
                match fetched {
                    Ok(user) => {
                        if let Err(e) = self.establish(token, user) {
                            warn!(error = %e, "could not refresh stored session");
                        }
                    }
                    Err(ClientError::Api { status: 401, .. }) => {
                        info!("stored session rejected by server");
                        self.clear_session();
                    }
                    Err(e) => warn!(error = %e, "session revalidation failed; keeping cached session"),
                }
            }
        }
        &self.state
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<CurrentUser, ClientError> {
        let body = json!({ "email": email, "password": password });
        let payload: AuthPayload = self
            .send(Method::POST, "/api/auth/login", Some(&body), None)
            .await?;
        self.establish(payload.token, payload.user)
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, ClientError> {
        let body = json!({ "name": name, "email": email, "password": password });
        let payload: AuthPayload = self
            .send(Method::POST, "/api/auth/register", Some(&body), None)
            .await?;
        self.establish(payload.token, payload.user)
    }

    /// Memory is always cleared; the error reports a storage failure only.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.state = SessionState::Unauthenticated;
        self.clear_storage()?;
        info!("logged out");
        Ok(())
    }

    /// Sends a JSON request carrying the bearer token when signed in. A 401
    /// while signed in drops the session.
    pub async fn authorized_request<B, T>(
        &mut self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.token().map(str::to_owned);
        let result = self.send(method, endpoint, body, token.as_deref()).await;
        if token.is_some() && matches!(result, Err(ClientError::Api { status: 401, .. })) {
            info!(endpoint, "token rejected; session ended");
            self.clear_session();
        }
        result
    }

    async fn send<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut req = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await.map_err(|e| {
            warn!(error = %e, endpoint, "request failed");
            ClientError::Unreachable
        })?;
        let status = res.status();
        let bytes = res.bytes().await.map_err(|_| ClientError::Unreachable)?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|b| b.message)
                .unwrap_or_else(|_| CONNECTIVITY_MESSAGE.to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(error = %e, endpoint, "response was not the expected JSON");
            ClientError::Unreachable
        })
    }

    fn load_stored(&self) -> Option<(String, CurrentUser)> {
        let read = |key: &str| match self.storage.get(key) {
            Ok(Some(v)) if !v.trim().is_empty() => Some(v),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, key, "session storage unreadable");
                None
            }
        };
        let token = read(TOKEN_KEY)?;
        let raw_user = read(USER_KEY)?;
        match serde_json::from_str::<CurrentUser>(&raw_user) {
            Ok(user) => Some((token, user)),
            Err(e) => {
                warn!(error = %e, "stored user is corrupted");
                None
            }
        }
    }

    /// Writes storage first, then memory. On a storage failure both keys are
    /// removed and the client drops to Unauthenticated, whatever it held before.
    fn establish(&mut self, token: String, user: CurrentUser) -> Result<CurrentUser, ClientError> {
        let raw_user = serde_json::to_string(&user)?;
        let written = self
            .storage
            .set(TOKEN_KEY, &token)
            .and_then(|_| self.storage.set(USER_KEY, &raw_user));
        if let Err(e) = written {
            self.clear_session();
            return Err(e.into());
        }
        info!(user_id = %user.id, "session established");
        self.state = SessionState::Authenticated {
            token,
            user: user.clone(),
        };
        Ok(user)
    }

    fn clear_session(&mut self) {
        self.state = SessionState::Unauthenticated;
        if let Err(e) = self.clear_storage() {
            warn!(error = %e, "could not clear session storage");
        }
    }

    fn clear_storage(&self) -> std::io::Result<()> {
        let token = self.storage.remove(TOKEN_KEY);
        let user = self.storage.remove(USER_KEY);
        token.and(user)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::client::storage::MemoryStore;

    fn user_json(id: Uuid) -> String {
        json!({ "id": id, "name": "Alex", "email": "alex@example.com", "avatar": null }).to_string()
    }

    #[tokio::test]
    async fn bootstrap_with_corrupted_user_is_unauthenticated() {
        let storage = MemoryStore::new();
        storage.set(TOKEN_KEY, "some.jwt.token").unwrap();
        storage.set(USER_KEY, "{not json").unwrap();

        let mut client = SessionClient::new("http://127.0.0.1:9", storage);
        assert_eq!(client.bootstrap(false).await, &SessionState::Unauthenticated);
        assert_eq!(client.storage().get(TOKEN_KEY).unwrap(), None);
        assert_eq!(client.storage().get(USER_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn bootstrap_with_token_but_no_user_is_unauthenticated() {
        let storage = MemoryStore::new();
        storage.set(TOKEN_KEY, "some.jwt.token").unwrap();

        let mut client = SessionClient::new("http://127.0.0.1:9", storage);
        assert_eq!(client.bootstrap(false).await, &SessionState::Unauthenticated);
        assert_eq!(client.storage().get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn bootstrap_restores_valid_session_without_network() {
        let id = Uuid::new_v4();
        let storage = MemoryStore::new();
        storage.set(TOKEN_KEY, "some.jwt.token").unwrap();
        storage.set(USER_KEY, &user_json(id)).unwrap();

        let mut client = SessionClient::new("http://127.0.0.1:9", storage);
        client.bootstrap(false).await;
        assert_eq!(client.token(), Some("some.jwt.token"));
        assert_eq!(client.user().map(|u| u.id), Some(id));
    }

    struct FailingStore;

    impl SessionStore for FailingStore {
        fn get(&self, _key: &str) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        }
        fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        }
        fn remove(&self, _key: &str) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn bootstrap_with_unreadable_storage_is_unauthenticated() {
        let mut client = SessionClient::new("http://127.0.0.1:9", FailingStore);
        assert_eq!(client.bootstrap(true).await, &SessionState::Unauthenticated);
    }

    #[test]
    fn failed_storage_write_leaves_memory_unchanged() {
        let mut client = SessionClient::new("http://127.0.0.1:9", FailingStore);
        let user = CurrentUser {
            id: Uuid::new_v4(),
            name: "Alex".into(),
            email: "alex@example.com".into(),
            avatar: None,
        };
        let err = client.establish("tok".into(), user).unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
        assert!(!client.is_authenticated());
    }

    /// Accepts writes until `locked` is set.
    #[derive(Default)]
    struct LockableStore {
        inner: MemoryStore,
        locked: std::sync::atomic::AtomicBool,
    }

    impl SessionStore for LockableStore {
        fn get(&self, key: &str) -> io::Result<Option<String>> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> io::Result<()> {
            if self.locked.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"));
            }
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> io::Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_write_over_existing_session_signs_out() {
        let mut client = SessionClient::new("http://127.0.0.1:9", LockableStore::default());
        let user = |name: &str| CurrentUser {
            id: Uuid::new_v4(),
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            avatar: None,
        };
        client.establish("tok-alex".into(), user("Alex")).unwrap();

        client
            .storage()
            .locked
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let err = client.establish("tok-sam".into(), user("Sam")).unwrap_err();

        assert!(matches!(err, ClientError::Storage(_)));
        assert_eq!(client.state(), &SessionState::Unauthenticated);
        assert_eq!(client.storage().get(TOKEN_KEY).unwrap(), None);
        assert_eq!(client.storage().get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn logout_clears_memory_and_storage() {
        let storage = MemoryStore::new();
        let mut client = SessionClient::new("http://127.0.0.1:9", storage);
        let user = CurrentUser {
            id: Uuid::new_v4(),
            name: "Alex".into(),
            email: "alex@example.com".into(),
            avatar: None,
        };
        client.establish("tok".into(), user).unwrap();
        assert!(client.is_authenticated());
        assert!(client.storage().get(TOKEN_KEY).unwrap().is_some());

        client.logout().unwrap();
        assert_eq!(client.state(), &SessionState::Unauthenticated);
        assert_eq!(client.storage().get(TOKEN_KEY).unwrap(), None);
        assert_eq!(client.storage().get(USER_KEY).unwrap(), None);
    }
}
