//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`; a `Transport` executes the round trip.
//! The session is borrowed per call, so the client never caches a token.
//!
//! Every request goes through [`TodoClient::request`], which merges the
//! default headers and the bearer credential. Every failed response goes
//! through `check_status`, which reduces the backend's error payload to one
//! message.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, CREDENTIALS_ERROR, UNKNOWN_ERROR};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, RequestBody, AUTHORIZATION, CONTENT_TYPE, FORM, JSON,
    WWW_AUTHENTICATE,
};
use crate::session::Session;
use crate::types::{AccessToken, CreateTodo, RegisteredUser, Registration, Todo, UpdateTodo};

/// Characters left as-is in `application/x-www-form-urlencoded` values.
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request against `path` (relative to the base URL).
    ///
    /// Form bodies get the form content type; everything else is sent as
    /// JSON. When `session` holds a token, an `Authorization: Bearer` header
    /// is added.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: RequestBody,
        session: Option<&Session>,
    ) -> HttpRequest {
        let (content_type, body) = match body {
            RequestBody::Empty => (JSON, None),
            RequestBody::Json(body) => (JSON, Some(body)),
            RequestBody::Form(body) => (FORM, Some(body)),
        };
        let mut headers = vec![(CONTENT_TYPE.to_string(), content_type.to_string())];
        if let Some(token) = session.and_then(Session::token) {
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers,
            body,
        }
    }

    pub fn build_root(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/", RequestBody::Empty, None)
    }

    /// The login contract is a form with `username`/`password` fields and no
    /// bearer header.
    pub fn build_login(&self, email: &str, password: &str) -> HttpRequest {
        let body = form_encode(&[("username", email), ("password", password)]);
        self.request(HttpMethod::Post, "/login", RequestBody::Form(body), None)
    }

    pub fn build_register(&self, email: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let body = to_json(&Registration {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        Ok(self.request(HttpMethod::Post, "/register", RequestBody::Json(body), None))
    }

    pub fn build_list_todos(&self, session: &Session) -> HttpRequest {
        self.request(HttpMethod::Get, "/todos/", RequestBody::Empty, Some(session))
    }

    pub fn build_get_todo(&self, session: &Session, id: i64) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/todos/{id}"),
            RequestBody::Empty,
            Some(session),
        )
    }

    pub fn build_create_todo(
        &self,
        session: &Session,
        input: &CreateTodo,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        Ok(self.request(HttpMethod::Post, "/todos/", RequestBody::Json(body), Some(session)))
    }

    pub fn build_update_todo(
        &self,
        session: &Session,
        id: i64,
        input: &UpdateTodo,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        Ok(self.request(
            HttpMethod::Put,
            &format!("/todos/{id}"),
            RequestBody::Json(body),
            Some(session),
        ))
    }

    pub fn build_delete_todo(&self, session: &Session, id: i64) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            &format!("/todos/{id}"),
            RequestBody::Empty,
            Some(session),
        )
    }

    pub fn parse_root(&self, response: HttpResponse) -> Result<serde_json::Value, ApiError> {
        parse_json(response)
    }

    /// Returns the access token. Failures become `Authentication` errors.
    pub fn parse_login(&self, response: HttpResponse) -> Result<String, ApiError> {
        if !response.is_success() {
            let message =
                error_detail(&response.body).unwrap_or_else(|| CREDENTIALS_ERROR.to_string());
            return Err(ApiError::Authentication(message));
        }
        let token: AccessToken = deserialize(&response.body)?;
        Ok(token.access_token)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<RegisteredUser, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    /// Any 2xx is a confirmation; the body is not interpreted.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn deserialize<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    deserialize(&response.body)
}

/// Map non-2xx responses to `ApiError::Http` with the backend's message.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 401 {
        tracing::debug!(
            challenge = response.header(WWW_AUTHENTICATE).unwrap_or("none"),
            "request not authorized"
        );
    }
    Err(ApiError::Http {
        status: response.status,
        message: error_detail(&response.body).unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
    })
}

/// Extract the `detail` message from an error body.
///
/// Accepts `{"detail": "..."}` and the validation shape
/// `{"detail": [{"msg": "..."}, ...]}`. Anything else yields `None`.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

fn form_encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, FORM_VALUE),
                utf8_percent_encode(v, FORM_VALUE)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
