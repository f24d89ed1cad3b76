//! JSON request/response bodies.

use super::error::ApiError;
use crate::api::{ContentItem, ContentType};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Body of `POST /v1/create`, `/v1/learn` and `/v1/infer`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RequestBody {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub content: Vec<WireItem>,
}

/// One content item. The payload is given either as `text` or as `base64`
/// bytes; an item with neither has an empty payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WireItem {
    #[serde(rename = "type", default)]
    pub kind: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl WireItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }

    fn into_item(self, idx: usize) -> Result<ContentItem, ApiError> {
        let payload = match (self.text, self.base64) {
            (Some(_), Some(_)) => {
                return Err(ApiError::bad_request(format!("content item {idx} has both 'text' and 'base64'")));
            }
            (Some(text), None) => text.into_bytes(),
            (None, Some(encoded)) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(|err| ApiError::bad_request(format!("content item {idx} has invalid base64: {err}")))?,
            (None, None) => Vec::new(),
        };
        Ok(ContentItem { kind: self.kind, payload, tags: self.tags })
    }
}

impl RequestBody {
    pub fn into_parts(self) -> Result<(String, Vec<ContentItem>), ApiError> {
        let content = self
            .content
            .into_iter()
            .enumerate()
            .map(|(idx, item)| item.into_item(idx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((self.tenant_id, content))
    }
}

/// Body returned by `POST /v1/infer`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferBody {
    pub message: String,
}
