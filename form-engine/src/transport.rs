//! Remote data collaborators.
//!
//! A [`Transport`] sends one request and answers with the remote
//! [`ApiResponse`] envelope. [`RestSource`] maps the form's load, create and
//! update calls onto configured endpoints of a transport.

use async_trait::async_trait;
use tracing::debug;

use crate::{ApiResponse, DataResponse, DataSource, FormData, FormError};

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors of a transport. Business failures are not errors: they arrive as
/// an envelope with `success: false`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

/// Sends requests to a backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `params` to `url`. `operation` is an optional tag naming the
    /// backend operation, for backends that multiplex one URL.
    async fn request(
        &self,
        url: &str,
        method: Method,
        operation: Option<&str>,
        params: &FormData,
    ) -> Result<ApiResponse, TransportError>;
}

/// One remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub method: Method,
    pub operation: Option<String>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            operation: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, Method::Get)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url, Method::Post)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(url, Method::Put)
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }
}

/// A data source backed by a transport and up to three endpoints.
///
/// Operations without an endpoint report a missing collaborator.
#[derive(Debug, Clone)]
pub struct RestSource<T> {
    transport: T,
    get: Option<Endpoint>,
    create: Option<Endpoint>,
    update: Option<Endpoint>,
}

impl<T: Transport> RestSource<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            get: None,
            create: None,
            update: None,
        }
    }

    pub fn with_get(mut self, endpoint: Endpoint) -> Self {
        self.get = Some(endpoint);
        self
    }

    pub fn with_create(mut self, endpoint: Endpoint) -> Self {
        self.create = Some(endpoint);
        self
    }

    pub fn with_update(mut self, endpoint: Endpoint) -> Self {
        self.update = Some(endpoint);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call(
        &self,
        endpoint: Option<&Endpoint>,
        collaborator: &'static str,
        params: &FormData,
    ) -> anyhow::Result<DataResponse> {
        let endpoint = endpoint.ok_or(FormError::MissingCollaborator(collaborator))?;
        debug!(url = %endpoint.url, method = %endpoint.method, collaborator, "remote call");

        let response = self
            .transport
            .request(
                &endpoint.url,
                endpoint.method,
                endpoint.operation.as_deref(),
                params,
            )
            .await?;
        Ok(DataResponse::from(response))
    }
}

#[async_trait]
impl<T: Transport> DataSource for RestSource<T> {
    async fn get_data(&self, params: &FormData) -> anyhow::Result<DataResponse> {
        self.call(self.get.as_ref(), "get_data", params).await
    }

    async fn create_data(&self, payload: &FormData) -> anyhow::Result<DataResponse> {
        self.call(self.create.as_ref(), "create_data", payload).await
    }

    async fn update_data(&self, payload: &FormData) -> anyhow::Result<DataResponse> {
        self.call(self.update.as_ref(), "update_data", payload).await
    }
}

#[cfg(feature = "http")]
pub use http::ReqwestTransport;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;

    use super::{Method, Transport, TransportError};
    use crate::{ApiResponse, FieldValue, FormData};

    /// Header carrying the operation tag.
    pub const OPERATION_HEADER: &str = "x-operation";

    /// JSON over HTTP. GET sends scalar params as the query string, other
    /// methods send the params as a JSON body.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
        base_url: Option<String>,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self {
                client,
                base_url: None,
            }
        }

        /// Prefix relative endpoint URLs with `base_url`.
        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = Some(base_url.into());
            self
        }

        fn full_url(&self, url: &str) -> String {
            match &self.base_url {
                Some(base) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
                }
                _ => url.to_string(),
            }
        }
    }

    fn query_pairs(params: &FormData) -> Vec<(String, String)> {
        params
            .iter()
            .filter_map(|(name, value)| {
                let text = match value {
                    FieldValue::Text(text) => text.clone(),
                    FieldValue::Number(n) => n.to_string(),
                    FieldValue::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((name.clone(), text))
            })
            .collect()
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn request(
            &self,
            url: &str,
            method: Method,
            operation: Option<&str>,
            params: &FormData,
        ) -> Result<ApiResponse, TransportError> {
            let url = self.full_url(url);
            let mut request = match method {
                Method::Get => self.client.get(&url).query(&query_pairs(params)),
                Method::Post => self.client.post(&url).json(params),
                Method::Put => self.client.put(&url).json(params),
                Method::Delete => self.client.delete(&url).json(params),
            };
            if let Some(operation) = operation {
                request = request.header(OPERATION_HEADER, operation);
            }

            let response = request
                .send()
                .await
                .map_err(|e| TransportError::Request {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if status.is_server_error() {
                return Err(TransportError::Status {
                    url,
                    status: status.as_u16(),
                });
            }

            response
                .json::<ApiResponse>()
                .await
                .map_err(|e| TransportError::InvalidResponse {
                    url,
                    message: e.to_string(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use pretty_assertions::assert_eq;

    /// Answers every request with a canned envelope and records the calls.
    #[derive(Default)]
    struct CannedTransport {
        answer: ApiResponse,
        calls: Mutex<Vec<(String, Method, Option<String>)>>,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn request(
            &self,
            url: &str,
            method: Method,
            operation: Option<&str>,
            _params: &FormData,
        ) -> Result<ApiResponse, TransportError> {
            self.calls.lock().unwrap().push((
                url.to_string(),
                method,
                operation.map(str::to_string),
            ));
            Ok(self.answer.clone())
        }
    }

    #[tokio::test]
    async fn calls_are_routed_to_their_endpoints() {
        let transport = CannedTransport {
            answer: ApiResponse::ok("ok").with_data(FormData::new().with("id", 4)),
            ..CannedTransport::default()
        };
        let source = RestSource::new(transport)
            .with_get(Endpoint::get("/customers").with_operation("customer.get"))
            .with_update(Endpoint::put("/customers"));

        let loaded = source.get_data(&FormData::new().with("id", 4)).await.unwrap();
        assert!(loaded.has_data());
        source.update_data(&FormData::new().with("id", 4)).await.unwrap();

        assert_eq!(
            *source.transport().calls.lock().unwrap(),
            vec![
                (
                    "/customers".to_string(),
                    Method::Get,
                    Some("customer.get".to_string())
                ),
                ("/customers".to_string(), Method::Put, None),
            ]
        );
    }

    #[tokio::test]
    async fn missing_endpoints_are_missing_collaborators() {
        let source = RestSource::new(CannedTransport::default());
        let err = source.create_data(&FormData::new()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FormError>(),
            Some(FormError::MissingCollaborator("create_data"))
        ));
    }
}
