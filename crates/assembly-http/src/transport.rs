//! Shared HTTP transport.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use assembly_core::error::{ApiError, Error, RequestError, TransportError};
use assembly_core::{AccessToken, Result};

use crate::config::ClientConfig;
use crate::request::{ApiRequest, Body, SKIP_AUTH};

pub(crate) const JSON: &str = "application/json";
pub(crate) const FORM: &str = "application/x-www-form-urlencoded";

/// A reqwest client bound to one base URL and default content type.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    client: reqwest::Client,
    config: ClientConfig,
}

/// A response with its body already read.
#[derive(Debug)]
pub(crate) struct Reply {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl Transport {
    pub fn new(config: ClientConfig, content_type: &'static str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RequestError::Build {
                message: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Turn a descriptor into a wire request.
    ///
    /// The [`SKIP_AUTH`] marker is always removed; `bearer`, when given,
    /// becomes the `Authorization` header.
    pub fn build(
        &self,
        request: &ApiRequest,
        bearer: Option<&AccessToken>,
    ) -> Result<reqwest::Request> {
        let raw_url = self.config.api_url.endpoint(&request.path);
        let url = Url::parse(&raw_url).map_err(|e| RequestError::Url {
            url: raw_url.clone(),
            reason: e.to_string(),
        })?;

        let mut headers = request.headers.clone();
        headers.remove(SKIP_AUTH);
        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&token.bearer()).map_err(|_| RequestError::Header {
                name: AUTHORIZATION.to_string(),
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            Some(Body::Json(value)) => builder.json(value),
            Some(Body::Form(fields)) => builder.form(fields),
            None => builder,
        };

        builder.build().map_err(|e| {
            RequestError::Build {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Send a wire request and read the whole response body.
    pub async fn send(&self, request: reqwest::Request) -> Result<Reply> {
        trace!(method = %request.method(), url = %request.url(), "sending request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| map_reqwest(e, self.config.timeout))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest(e, self.config.timeout))?
            .to_vec();

        trace!(status = %status, bytes = body.len(), "response received");
        Ok(Reply { status, body })
    }
}

impl Reply {
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    pub fn into_api_error(self) -> ApiError {
        ApiError::from_bytes(self.status.as_u16(), &self.body)
    }

    /// Success bodies decode into `R`; anything else becomes an [`ApiError`].
    ///
    /// An empty success body decodes as JSON `null`.
    pub fn into_result<R: DeserializeOwned>(self) -> Result<R> {
        if !self.status.is_success() {
            return Err(self.into_api_error().into());
        }

        let decoded = if self.body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(&self.body)
        };

        decoded.map_err(|e| {
            TransportError::Body {
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// Classify a reqwest failure.
pub(crate) fn map_reqwest(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_builder() {
        RequestError::Build {
            message: err.to_string(),
        }
        .into()
    } else if err.is_timeout() {
        TransportError::Timeout {
            duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
        .into()
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
        .into()
    } else if err.is_body() || err.is_decode() {
        TransportError::Body {
            message: err.to_string(),
        }
        .into()
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transport() -> Transport {
        Transport::new(ClientConfig::default(), JSON).unwrap()
    }

    #[test]
    fn build_strips_skip_auth_and_sets_bearer() {
        let request = ApiRequest::get("/units").skip_auth();
        let wire = transport()
            .build(&request, Some(&AccessToken::new("t1")))
            .unwrap();
        assert!(wire.headers().get(SKIP_AUTH).is_none());
        assert_eq!(wire.headers()[AUTHORIZATION], "Bearer t1");
        assert_eq!(wire.url().as_str(), "http://localhost:8000/api/v1/units");
    }

    #[test]
    fn build_encodes_query_and_json_body() {
        let request = ApiRequest::post("/meetings")
            .query("building", "B")
            .json(&json!({"title": "Annual assembly"}))
            .unwrap();
        let wire = transport().build(&request, None).unwrap();
        assert_eq!(wire.url().query(), Some("building=B"));
        assert!(wire.headers().get(AUTHORIZATION).is_none());
        let body = wire.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(
            serde_json::from_slice::<Value>(body).unwrap(),
            json!({"title": "Annual assembly"})
        );
    }

    #[test]
    fn bearer_with_control_characters_is_rejected() {
        let err = transport()
            .build(&ApiRequest::get("/units"), Some(&AccessToken::new("bad\ntoken")))
            .unwrap_err();
        assert_eq!(err.kind(), assembly_core::ErrorKind::RequestConstruction);
    }

    #[test]
    fn reply_decoding() {
        let ok = Reply {
            status: StatusCode::OK,
            body: br#"{"id": 3}"#.to_vec(),
        };
        assert_eq!(ok.into_result::<Value>().unwrap(), json!({"id": 3}));

        let empty = Reply {
            status: StatusCode::NO_CONTENT,
            body: Vec::new(),
        };
        assert_eq!(empty.into_result::<Value>().unwrap(), Value::Null);

        let failed = Reply {
            status: StatusCode::BAD_REQUEST,
            body: br#"{"detail": "invalid credentials"}"#.to_vec(),
        };
        let err = failed.into_result::<Value>().unwrap_err();
        assert_eq!(err.status(), Some(400));
    }
}
