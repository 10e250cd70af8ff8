pub mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::auth::SessionStore;
use crate::config::ApiConfig;
use crate::error::ClientError;
use crate::permissions::{PermissionSet, PermissionSource};

use models::{
    LoginRequest, LoginResponse, PermissionEnvelope, PermissionUpdate, Staff, StaffInput, Student,
    StudentInput,
};

/// HTTP client for the school backend.
///
/// When bound to a session store, the current bearer token is attached to
/// every request.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Option<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            session: None,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    // Each segment is percent-encoded, so ids cannot alter the route
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(segments)?;
        tracing::debug!("{} {}", method, url);

        let mut builder = self.http.request(method, url);
        if let Some(token) = self.session.as_ref().and_then(SessionStore::token) {
            builder = builder.bearer_auth(token.as_str());
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::from_status(status.as_u16(), &body));
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    // Auth

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let builder = self.request(Method::POST, &["auth", "login"])?.json(&body);
        self.send(builder).await
    }

    // Permissions

    pub async fn get_permissions(&self, user_id: &str) -> Result<PermissionSet, ClientError> {
        let builder = self.request(Method::GET, &["permission", "get", user_id])?;
        let envelope: PermissionEnvelope = self.send(builder).await?;
        Ok(envelope.into())
    }

    pub async fn set_permissions(
        &self,
        user_id: &str,
        permissions: PermissionSet,
    ) -> Result<Value, ClientError> {
        let body = PermissionUpdate::from(permissions);
        let builder = self.request(Method::POST, &["permission", user_id])?.json(&body);
        self.send(builder).await
    }

    // Students

    pub async fn list_students(&self) -> Result<Vec<Student>, ClientError> {
        let builder = self.request(Method::GET, &["student", "get"])?;
        self.send(builder).await
    }

    pub async fn create_student(&self, input: &StudentInput) -> Result<Value, ClientError> {
        let builder = self.request(Method::POST, &["student", "create"])?.json(input);
        self.send(builder).await
    }

    pub async fn update_student(&self, id: &str, input: &StudentInput) -> Result<Value, ClientError> {
        let builder = self.request(Method::PUT, &["student", "edit", id])?.json(input);
        self.send(builder).await
    }

    pub async fn delete_student(&self, id: &str) -> Result<Value, ClientError> {
        let builder = self.request(Method::DELETE, &["student", "delete", id])?;
        self.send(builder).await
    }

    // Staff

    pub async fn list_staff(&self) -> Result<Vec<Staff>, ClientError> {
        let builder = self.request(Method::GET, &["staff", "get"])?;
        self.send(builder).await
    }

    pub async fn create_staff(&self, input: &StaffInput) -> Result<Value, ClientError> {
        let builder = self.request(Method::POST, &["staff", "create"])?.json(input);
        self.send(builder).await
    }

    pub async fn update_staff(&self, id: &str, input: &StaffInput) -> Result<Value, ClientError> {
        let builder = self.request(Method::PUT, &["staff", "edit", id])?.json(input);
        self.send(builder).await
    }

    pub async fn delete_staff(&self, id: &str) -> Result<Value, ClientError> {
        let builder = self.request(Method::DELETE, &["staff", "delete", id])?;
        self.send(builder).await
    }
}

#[async_trait]
impl PermissionSource for ApiClient {
    async fn fetch_permissions(&self, staff_id: &str) -> Result<PermissionSet, ClientError> {
        self.get_permissions(staff_id).await
    }

    async fn store_permissions(
        &self,
        staff_id: &str,
        permissions: PermissionSet,
    ) -> Result<(), ClientError> {
        self.set_permissions(staff_id, permissions).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn joins_segments_onto_base_path() {
        let api = client("http://localhost:5000/api");
        assert_eq!(
            api.endpoint(&["permission", "get", "u1"]).unwrap().as_str(),
            "http://localhost:5000/api/permission/get/u1"
        );

        let api = client("http://localhost:5000/api/");
        assert_eq!(
            api.endpoint(&["auth", "login"]).unwrap().as_str(),
            "http://localhost:5000/api/auth/login"
        );
    }

    #[test]
    fn encodes_ids_as_single_segment() {
        let api = client("http://localhost:5000");
        assert_eq!(
            api.endpoint(&["student", "delete", "../staff"]).unwrap().as_str(),
            "http://localhost:5000/student/delete/..%2Fstaff"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(ApiClient::new("mailto:admin@example.com", Duration::from_secs(1)).is_err());
    }
}
