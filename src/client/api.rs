use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::{
    auth::dto::{CredentialsRequest, ErrorBody, LoginResponse, ProfileResponse, RegisterResponse},
    client::ClientError,
};

/// Talks to the `/api/users` endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` points at the API root, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ClientError> {
        let resp = self
            .http
            .post(self.url("/users/register"))
            .json(&credentials(email, password))
            .send()
            .await?;
        parse(resp).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let resp = self
            .http
            .post(self.url("/users/login"))
            .json(&credentials(email, password))
            .send()
            .await?;
        parse(resp).await
    }

    #[instrument(skip_all)]
    pub async fn me(&self, token: &str) -> Result<ProfileResponse, ClientError> {
        let resp = self
            .http
            .get(self.url("/users/me"))
            .bearer_auth(token)
            .send()
            .await?;
        parse(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn credentials(email: &str, password: &str) -> CredentialsRequest {
    CredentialsRequest {
        email: Some(email.to_owned()),
        password: Some(password.to_owned()),
    }
}

async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }

    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_owned(),
    };
    debug!(%status, %message, "api call failed");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let api = ApiClient::new("http://localhost:8000/api/");
        assert_eq!(api.url("/users/me"), "http://localhost:8000/api/users/me");
    }

    #[test]
    fn api_error_exposes_status() {
        let err = ClientError::Api {
            status: 409,
            message: "Email already registered".into(),
        };
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.to_string(), "409: Email already registered");
    }
}
