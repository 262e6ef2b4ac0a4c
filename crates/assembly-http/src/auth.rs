//! Login, refresh and logout against the platform's auth endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use assembly_core::{
    AccessToken, AuthService, Credentials, LoginResponse, RefreshResponse, RefreshToken, Result,
    Session, SessionStore, TokenStore,
};

use crate::authenticated::AuthenticatedClient;
use crate::config::ClientConfig;
use crate::endpoints::{AUTH_LOGOUT, AUTH_REFRESH, LogoutRequest, RefreshRequest};
use crate::public::{FormClient, PublicClient};
use crate::request::ApiRequest;
use crate::shell::Shell;

/// The platform's auth endpoints.
#[derive(Debug, Clone)]
pub struct HttpAuthService {
    public: PublicClient,
    form: FormClient,
}

impl HttpAuthService {
    pub fn new(config: &ClientConfig, shell: &Shell) -> Result<Self> {
        Ok(Self {
            public: PublicClient::new(config.clone(), shell)?,
            form: FormClient::new(config.clone(), shell)?,
        })
    }

    pub fn public(&self) -> &PublicClient {
        &self.public
    }

    /// Submit the login form and return the new session. Nothing is stored.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let login_path = self.public.config().login_path.clone();
        let response: LoginResponse = self
            .form
            .submit(
                &login_path,
                [
                    ("username", credentials.username()),
                    ("password", credentials.password()),
                ],
            )
            .await?;

        response.into_session()
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshResponse> {
        debug!("calling refresh endpoint");
        let request = ApiRequest::post(AUTH_REFRESH).json(&RefreshRequest {
            refresh_token: refresh_token.as_str(),
        })?;
        // The authenticated client reports refresh failures itself.
        self.public.execute(request).await
    }
}

/// Everything a front-end needs for one signed-in user: the clients, the
/// token store and the auth flows, wired to a single session store.
#[derive(Debug, Clone)]
pub struct SessionManager {
    auth: Arc<HttpAuthService>,
    client: AuthenticatedClient,
}

impl SessionManager {
    pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>, shell: Shell) -> Result<Self> {
        let auth = Arc::new(HttpAuthService::new(&config, &shell)?);
        let client =
            AuthenticatedClient::new(config, TokenStore::new(store), auth.clone(), shell)?;
        Ok(Self { auth, client })
    }

    /// Client for authenticated endpoints.
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Client for unauthenticated endpoints.
    pub fn public(&self) -> &PublicClient {
        self.auth.public()
    }

    pub fn tokens(&self) -> &TokenStore {
        self.client.tokens()
    }

    /// Log in, persist the session and clear any earlier refresh failures.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let session = self.auth.login(credentials).await?;
        self.tokens().save(&session)?;
        self.client.coordinator().reset_attempts();
        info!(username = %credentials.username(), "logged in");
        Ok(session)
    }

    /// Revoke the session server-side (best effort) and clear it locally.
    pub async fn logout(&self) -> Result<()> {
        if let Some(refresh_token) = self.tokens().refresh_token()? {
            let request = ApiRequest::post(AUTH_LOGOUT)
                .json(&LogoutRequest {
                    refresh_token: refresh_token.as_str(),
                })?
                .without_refresh();
            if let Err(err) = self.client.execute::<Value>(request).await {
                warn!(error = %err, "server-side logout failed");
            }
        }

        self.tokens().clear()?;
        info!("logged out");
        Ok(())
    }

    /// The signed-in user's record, if a session is stored.
    pub fn current_user(&self) -> Result<Option<Value>> {
        self.tokens().user()
    }

    /// Force a refresh through the coordinator.
    pub async fn refresh(&self) -> Result<AccessToken> {
        self.client.refresh().await
    }
}
