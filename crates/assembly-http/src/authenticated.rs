//! Bearer-token client with refresh-and-replay on 401.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use assembly_core::error::{AuthError, Error};
use assembly_core::{AccessToken, AuthService, Result, TokenStore};

use crate::config::ClientConfig;
use crate::coordinator::{Acquire, RefreshCoordinator};
use crate::presenter::ErrorPresenter;
use crate::request::ApiRequest;
use crate::shell::Shell;
use crate::transport::{JSON, Transport};

/// Client for endpoints that require the signed-in user's access token.
///
/// Every request is intercepted to attach `Authorization: Bearer <token>`
/// from the [`TokenStore`]. A 401 triggers at most one refresh per request:
///
/// - a request that was already replayed fails with `AuthExpired`;
/// - a refresh already running is joined, and its token reused;
/// - past the attempt ceiling the session is dropped (`AuthExhausted`);
/// - otherwise this request refreshes and then replays itself.
///
/// A failed refresh clears the session, sends the shell to the login route,
/// and fails this request and every queued one with the same error.
///
/// Clones share the coordinator, so all of them refresh as one.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Transport,
    tokens: TokenStore,
    auth: Arc<dyn AuthService>,
    coordinator: RefreshCoordinator,
    shell: Shell,
    presenter: ErrorPresenter,
}

impl AuthenticatedClient {
    pub fn new(
        config: ClientConfig,
        tokens: TokenStore,
        auth: Arc<dyn AuthService>,
        shell: Shell,
    ) -> Result<Self> {
        let coordinator = RefreshCoordinator::new(config.max_refresh_attempts);
        let presenter = ErrorPresenter::new(shell.notifier.clone(), config.login_path.clone());

        Ok(Self {
            inner: Arc::new(ClientInner {
                transport: Transport::new(config, JSON)?,
                tokens,
                auth,
                coordinator,
                shell,
                presenter,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.transport.config()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    /// Request interception: the wire request `request` would go out as.
    ///
    /// Attaches the stored bearer token unless the request is marked
    /// [`SKIP_AUTH`](crate::SKIP_AUTH); the marker itself is stripped.
    pub fn build_request(&self, request: &ApiRequest) -> Result<reqwest::Request> {
        let bearer = self.bearer_for(request)?;
        self.inner.transport.build(request, bearer.as_ref())
    }

    fn bearer_for(&self, request: &ApiRequest) -> Result<Option<AccessToken>> {
        if request.skips_auth() {
            Ok(None)
        } else {
            self.inner.tokens.access_token()
        }
    }

    /// Send a request, presenting any failure to the user.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let path = request.path.clone();
        let result = self.execute(request).await;

        if let Err(ref err) = result {
            self.inner.presenter.present(&path, err);
        }

        result
    }

    /// Send a request without presenting failures.
    pub async fn execute<R: DeserializeOwned>(&self, mut request: ApiRequest) -> Result<R> {
        let mut bearer = self.bearer_for(&request)?;
        let mut outgoing = self.inner.transport.build(&request, bearer.as_ref())?;

        loop {
            let reply = self.inner.transport.send(outgoing).await?;
            if !reply.is_unauthorized() {
                return reply.into_result();
            }

            let rejection = reply.into_api_error();
            if request.retry || request.skips_auth() {
                debug!(retry = request.retry, "401 is terminal for this request");
                return Err(AuthError::Expired(rejection).into());
            }

            request.retry = true;
            let token = match self.newer_token(bearer.as_ref())? {
                Some(token) => {
                    debug!("token was refreshed while the request was in flight");
                    token
                }
                None => self.recover().await?,
            };
            debug!("replaying request with refreshed token");
            outgoing = self.inner.transport.build(&request, Some(&token))?;
            bearer = Some(token);
        }
    }

    /// The stored access token, if it differs from the one a request was sent
    /// with.
    fn newer_token(&self, sent: Option<&AccessToken>) -> Result<Option<AccessToken>> {
        Ok(self
            .inner
            .tokens
            .access_token()?
            .filter(|stored| sent != Some(stored)))
    }

    /// Refresh the session now, or join a refresh that is already running.
    pub async fn refresh(&self) -> Result<AccessToken> {
        self.recover().await
    }

    async fn recover(&self) -> Result<AccessToken> {
        let pending = match self.inner.coordinator.acquire() {
            Acquire::Exhausted { attempts } => {
                warn!(attempts, "refresh attempts exhausted, dropping session");
                self.invalidate_session();
                return Err(AuthError::Exhausted { attempts }.into());
            }
            Acquire::Queued(pending) => pending,
            Acquire::Leader(guard) => {
                let outcome = self
                    .refresh_tokens()
                    .await
                    .map_err(|e| Error::from(AuthError::RefreshFailed(Box::new(e))));

                match outcome {
                    Ok(_) => info!("session refreshed"),
                    Err(ref err) => {
                        warn!(error = %err, "refresh failed, dropping session");
                        self.invalidate_session();
                    }
                }

                guard.release(outcome.clone());
                return outcome;
            }
        };

        debug!("waiting for in-flight refresh");
        pending.wait().await
    }

    async fn refresh_tokens(&self) -> Result<AccessToken> {
        let refresh_token = self
            .inner
            .tokens
            .refresh_token()?
            .ok_or(AuthError::MissingRefreshToken)?;

        let (access_token, rotated) = self
            .inner
            .auth
            .refresh(&refresh_token)
            .await?
            .into_tokens()?;

        self.inner
            .tokens
            .update_tokens(&access_token, rotated.as_ref())?;
        Ok(access_token)
    }

    fn invalidate_session(&self) {
        if let Err(err) = self.inner.tokens.clear() {
            warn!(error = %err, "failed to clear stored session");
        }
        self.inner
            .shell
            .redirect_to_login(&self.config().login_route);
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.send(ApiRequest::delete(path)).await
    }
}

impl fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("api_url", &self.config().api_url)
            .field("refresh", &self.inner.coordinator.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use assembly_core::{MemorySessionStore, RefreshResponse, RefreshToken, Session};
    use async_trait::async_trait;
    use reqwest::header::AUTHORIZATION;
    use serde_json::Value;

    use super::*;
    use crate::request::SKIP_AUTH;

    struct NeverRefresh;

    #[async_trait]
    impl AuthService for NeverRefresh {
        async fn refresh(&self, _: &RefreshToken) -> Result<RefreshResponse> {
            Ok(RefreshResponse::default())
        }
    }

    fn client_with_token(token: Option<&str>) -> AuthenticatedClient {
        let tokens = TokenStore::new(Arc::new(MemorySessionStore::new()));
        if let Some(token) = token {
            tokens
                .save(&Session::new(
                    AccessToken::new(token),
                    RefreshToken::new("r1"),
                    Value::Null,
                ))
                .unwrap();
        }
        AuthenticatedClient::new(
            ClientConfig::default(),
            tokens,
            Arc::new(NeverRefresh),
            Shell::headless(),
        )
        .unwrap()
    }

    #[test]
    fn stored_token_is_attached() {
        let client = client_with_token(Some("expired-1"));
        let wire = client.build_request(&ApiRequest::get("/units")).unwrap();
        assert_eq!(wire.headers()[AUTHORIZATION], "Bearer expired-1");
    }

    #[test]
    fn skip_auth_omits_token_and_marker() {
        let client = client_with_token(Some("expired-1"));
        let wire = client
            .build_request(&ApiRequest::get("/public/buildings").skip_auth())
            .unwrap();
        assert!(wire.headers().get(AUTHORIZATION).is_none());
        assert!(wire.headers().get(SKIP_AUTH).is_none());
    }

    #[test]
    fn no_token_means_no_header() {
        let client = client_with_token(None);
        let wire = client.build_request(&ApiRequest::get("/units")).unwrap();
        assert!(wire.headers().get(AUTHORIZATION).is_none());
    }
}
