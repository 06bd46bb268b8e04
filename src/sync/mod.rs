//! Request and response model for the dashboard API, and reconciliation of
//! confirmed results into the visual tree.

pub mod reconcile;

use http::{Method, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::entity::{EntityId, EntityRef};
use crate::icon::IconFile;
use crate::tree::TreeError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{method} {path} failed before a response arrived")]
    Transport {
        method: Method,
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("response body is not valid json: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("created {0} is missing from the response body")]
    MissingCreatedEntity(&'static str),
    #[error("template `{0}` is missing from the page")]
    MissingTemplate(&'static str),
    #[error("template `{template}` has no `{part}` element")]
    MalformedTemplate {
        template: &'static str,
        part: &'static str,
    },
    #[error(transparent)]
    Tree(#[from] TreeError),
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(IconFile),
}

/// Multipart-style request body. Field order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_text(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .push((name.to_string(), FormValue::Text(value.into())));
    }

    pub fn append_file(&mut self, name: &str, file: IconFile) {
        self.entries.push((name.to_string(), FormValue::File(file)));
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FormValue::Text(value) => Some(value),
            FormValue::File(_) => None,
        }
    }

    pub fn file(&self, name: &str) -> Option<&IconFile> {
        match self.get(name)? {
            FormValue::File(file) => Some(file),
            FormValue::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Create,
    Update,
    Delete,
}

impl RequestKind {
    pub fn success_status(self) -> StatusCode {
        match self {
            Self::Create => StatusCode::CREATED,
            Self::Update | Self::Delete => StatusCode::OK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub kind: RequestKind,
    pub method: Method,
    pub path: String,
    pub body: FormData,
}

impl SyncRequest {
    pub fn create_category(body: FormData) -> Self {
        Self {
            kind: RequestKind::Create,
            method: Method::POST,
            path: "/api/category".to_string(),
            body,
        }
    }

    pub fn create_link(category_id: EntityId, body: FormData) -> Self {
        Self {
            kind: RequestKind::Create,
            method: Method::POST,
            path: format!("/api/category/{category_id}/link"),
            body,
        }
    }

    pub fn update(entity: EntityRef, body: FormData) -> Self {
        Self {
            kind: RequestKind::Update,
            method: Method::PATCH,
            path: entity.api_path(),
            body,
        }
    }

    pub fn delete(entity: EntityRef) -> Self {
        Self {
            kind: RequestKind::Delete,
            method: Method::DELETE,
            path: entity.api_path(),
            body: FormData::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedCategory {
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedLink {
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub category: Option<CreatedCategory>,
    #[serde(default)]
    pub link: Option<CreatedLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

impl SyncResponse {
    pub fn new(status: StatusCode, body: ResponseBody) -> Self {
        Self { status, body }
    }

    /// Parses a raw response. An empty body is treated as `{}`.
    pub fn from_json(status: StatusCode, raw: &[u8]) -> SyncResult<Self> {
        let body = if raw.iter().all(u8::is_ascii_whitespace) {
            ResponseBody::default()
        } else {
            serde_json::from_slice(raw)?
        };
        Ok(Self { status, body })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Accepted(ResponseBody),
    Rejected { status: StatusCode, message: String },
}

/// Anything but the kind's success status is a rejection carrying the
/// server's message.
pub fn classify(kind: RequestKind, response: SyncResponse) -> SyncOutcome {
    if response.status == kind.success_status() {
        return SyncOutcome::Accepted(response.body);
    }
    let message = response.body.message.unwrap_or_else(|| {
        response
            .status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    SyncOutcome::Rejected {
        status: response.status,
        message,
    }
}

/// Connection to the dashboard server.
pub trait Transport {
    fn send(&mut self, request: &SyncRequest) -> anyhow::Result<SyncResponse>;
}

pub(crate) fn send_with(
    transport: &mut dyn Transport,
    request: &SyncRequest,
) -> SyncResult<SyncResponse> {
    tracing::debug!(method = %request.method, path = %request.path, "sending request");
    transport
        .send(request)
        .map_err(|source| SyncError::Transport {
            method: request.method.clone(),
            path: request.path.clone(),
            source,
        })
}
