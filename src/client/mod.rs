//! HTTP client for the catalog API, used by the web front-end.
//!
//! Every call takes the caller's cached bearer token, makes exactly one
//! attempt and maps the response status into a [`ClientError`].

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::WebConfig;
use crate::db::Product;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not authorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("API request failed with status {0}")]
    Failure(StatusCode),
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Status to show the browser when rendering this failure
    pub fn status(&self) -> StatusCode {
        match self {
            ClientError::Unauthorized => StatusCode::UNAUTHORIZED,
            ClientError::NotFound => StatusCode::NOT_FOUND,
            ClientError::Failure(status) => *status,
            ClientError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

/// Catalog API client sharing one connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(config: &WebConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token and send once.
    async fn send(&self, request: RequestBuilder, token: Option<&str>) -> ClientResult<Response> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        tracing::debug!(status = %status, url = %response.url(), "Catalog API call failed");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
            StatusCode::NOT_FOUND => ClientError::NotFound,
            other => ClientError::Failure(other),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: Option<&str>,
    ) -> ClientResult<T> {
        let response = self.send(request, token).await?;
        Ok(response.json().await?)
    }

    /// Exchange credentials for a bearer token
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<String> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginBody { username, password });

        let response = self.send(request, None).await?;
        Ok(response.text().await?.trim().to_string())
    }

    pub async fn list_products(&self, token: Option<&str>) -> ClientResult<Vec<Product>> {
        self.send_json(self.http.get(self.url("/products")), token)
            .await
    }

    pub async fn get_product(&self, id: i64, token: Option<&str>) -> ClientResult<Product> {
        self.send_json(self.http.get(self.url(&format!("/products/{}", id))), token)
            .await
    }

    pub async fn create_product(
        &self,
        product: &Product,
        token: Option<&str>,
    ) -> ClientResult<Product> {
        self.send_json(self.http.post(self.url("/products")).json(product), token)
            .await
    }

    /// PUT the product to its own id
    pub async fn update_product(&self, product: &Product, token: Option<&str>) -> ClientResult<()> {
        let request = self
            .http
            .put(self.url(&format!("/products/{}", product.id)))
            .json(product);
        self.send(request, token).await?;
        Ok(())
    }

    pub async fn delete_product(&self, id: i64, token: Option<&str>) -> ClientResult<()> {
        let request = self.http.delete(self.url(&format!("/products/{}", id)));
        self.send(request, token).await?;
        Ok(())
    }
}
