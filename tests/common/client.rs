//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all quotes-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client carrying an optional session token.
///
/// The token is sent as the raw value of the Authorization header, which is
/// how the API expects it (no Bearer prefix).
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    token: Option<String>,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing registration/login flows and public endpoints.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// Creates a client logged in as the standard regular user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    /// Creates a client logged in as the standard admin user
    pub async fn authenticated_admin(base_url: String) -> Self {
        Self::authenticated_as(base_url, ADMIN_USER, ADMIN_PASS).await
    }

    /// Creates a client logged in as an arbitrary seeded user
    pub async fn authenticated_as(base_url: String, username: &str, password: &str) -> Self {
        let mut client = Self::new(base_url);

        let response = client.login(username, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Authentication failed for {}",
            username
        );
        let body: serde_json::Value = response.json().await.expect("Login response was not JSON");
        let token = body["token"]
            .as_str()
            .expect("Login response carried no token")
            .to_string();

        client.token = Some(token);
        client
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", token);
        }
        builder
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /auth/register
    pub async fn register(&self, username: &str, password: &str) -> Response {
        self.request(reqwest::Method::POST, "/auth/register")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// POST /auth/login
    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.request(reqwest::Method::POST, "/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    // ========================================================================
    // Quote Endpoints
    // ========================================================================

    /// GET /quotes with an optional query string like "?page=2&limit=5"
    pub async fn list_quotes(&self, query: &str) -> Response {
        self.request(reqwest::Method::GET, &format!("/quotes{}", query))
            .send()
            .await
            .expect("List quotes request failed")
    }

    /// GET /quotes/{id}
    pub async fn get_quote(&self, id: i64) -> Response {
        self.request(reqwest::Method::GET, &format!("/quotes/{}", id))
            .send()
            .await
            .expect("Get quote request failed")
    }

    /// POST /quotes
    pub async fn create_quote(&self, content: &str, author: &str) -> Response {
        self.request(reqwest::Method::POST, "/quotes")
            .json(&json!({ "content": content, "author": author }))
            .send()
            .await
            .expect("Create quote request failed")
    }

    /// Creates a quote and returns its id
    pub async fn create_quote_id(&self, content: &str, author: &str) -> i64 {
        let response = self.create_quote(content, author).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        body["id"].as_i64().expect("Created quote carried no id")
    }

    /// PUT /quotes/{id}
    pub async fn update_quote(&self, id: i64, content: &str, author: &str) -> Response {
        self.request(reqwest::Method::PUT, &format!("/quotes/{}", id))
            .json(&json!({ "content": content, "author": author }))
            .send()
            .await
            .expect("Update quote request failed")
    }

    /// DELETE /quotes/{id}
    pub async fn delete_quote(&self, id: i64) -> Response {
        self.request(reqwest::Method::DELETE, &format!("/quotes/{}", id))
            .send()
            .await
            .expect("Delete quote request failed")
    }

    /// POST /quotes/{id}/like
    pub async fn like_quote(&self, id: i64) -> Response {
        self.request(reqwest::Method::POST, &format!("/quotes/{}/like", id))
            .send()
            .await
            .expect("Like request failed")
    }

    /// POST /quotes/{id}/dislike
    pub async fn dislike_quote(&self, id: i64) -> Response {
        self.request(reqwest::Method::POST, &format!("/quotes/{}/dislike", id))
            .send()
            .await
            .expect("Dislike request failed")
    }

    /// PUT /quotes/{id}/verify
    pub async fn verify_quote(&self, id: i64) -> Response {
        self.request(reqwest::Method::PUT, &format!("/quotes/{}/verify", id))
            .send()
            .await
            .expect("Verify request failed")
    }

    // ========================================================================
    // Comment Endpoints
    // ========================================================================

    /// POST /comments
    pub async fn create_comment(&self, content: &str, quote_id: i64) -> Response {
        self.request(reqwest::Method::POST, "/comments")
            .json(&json!({ "content": content, "quoteId": quote_id }))
            .send()
            .await
            .expect("Create comment request failed")
    }

    /// GET /comments/{quoteId}
    pub async fn get_comments(&self, quote_id: i64) -> Response {
        self.request(reqwest::Method::GET, &format!("/comments/{}", quote_id))
            .send()
            .await
            .expect("Get comments request failed")
    }
}
