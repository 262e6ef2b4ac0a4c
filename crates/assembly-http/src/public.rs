//! Clients for unauthenticated endpoints.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use assembly_core::Result;

use crate::config::ClientConfig;
use crate::presenter::ErrorPresenter;
use crate::request::ApiRequest;
use crate::shell::Shell;
use crate::transport::{FORM, JSON, Transport};

/// JSON client that never sends a bearer token and never refreshes.
///
/// A 401 comes back to the caller untouched: no notification, no redirect,
/// no session change.
#[derive(Debug, Clone)]
pub struct PublicClient {
    transport: Transport,
    presenter: ErrorPresenter,
}

impl PublicClient {
    pub fn new(config: ClientConfig, shell: &Shell) -> Result<Self> {
        Self::with_content_type(config, shell, JSON)
    }

    fn with_content_type(
        config: ClientConfig,
        shell: &Shell,
        content_type: &'static str,
    ) -> Result<Self> {
        let presenter = ErrorPresenter::new(shell.notifier.clone(), config.login_path.clone());
        Ok(Self {
            transport: Transport::new(config, content_type)?,
            presenter,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    /// Send a request and present any failure other than a 401.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let path = request.path.clone();
        let result = self.execute(request).await;

        if let Err(ref err) = result
            && err.status() != Some(401)
        {
            self.presenter.present(&path, err);
        }

        result
    }

    /// Send a request without presenting failures.
    pub async fn execute<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        debug!("public request");
        let outgoing = self.transport.build(&request, None)?;
        self.transport.send(outgoing).await?.into_result()
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
}

/// Public client for `application/x-www-form-urlencoded` submissions.
#[derive(Debug, Clone)]
pub struct FormClient {
    inner: PublicClient,
}

impl FormClient {
    pub fn new(config: ClientConfig, shell: &Shell) -> Result<Self> {
        Ok(Self {
            inner: PublicClient::with_content_type(config, shell, FORM)?,
        })
    }

    /// POST `fields` to `path` as a url-encoded form.
    pub async fn submit<R, K, V>(
        &self,
        path: &str,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Result<R>
    where
        R: DeserializeOwned,
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.send(ApiRequest::post(path).form(fields)).await
    }
}
