//! Client for the conversational geodata backend.
//!
//! One request/response shape: a natural-language message goes out, a
//! reply message plus an optional feature collection and view position
//! come back. Requests are abandoned after 30 seconds and surfaced as a
//! readable notification; a failed request never touches session state.

use std::time::Duration;

use foundation::LonLat;
use geodata::FeatureCollection;
use serde_json::{json, Value};
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub message: String,
    pub collection: Option<FeatureCollection>,
    pub view_position: Option<LonLat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantError {
    Timeout,
    Status(u16),
    Network(String),
    Decode(String),
}

impl std::fmt::Display for AssistantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssistantError::Timeout => write!(f, "no response from the assistant (timed out)"),
            AssistantError::Status(code) => write!(f, "assistant returned status {code}"),
            AssistantError::Network(msg) => write!(f, "network error: {msg}"),
            AssistantError::Decode(msg) => write!(f, "unreadable assistant reply: {msg}"),
        }
    }
}

impl std::error::Error for AssistantError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// User-facing toast for one query's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn for_reply(reply: &AssistantReply) -> Option<Self> {
        let collection = reply.collection.as_ref()?;
        let source = collection
            .metadata
            .source
            .as_deref()
            .unwrap_or("unknown source");
        Some(Self {
            message: format!(
                "Loaded {} features from {source}",
                collection.metadata.feature_count
            ),
            kind: NotificationKind::Success,
        })
    }

    pub fn for_error(error: &AssistantError) -> Self {
        Self {
            message: format!("Error: {error}"),
            kind: NotificationKind::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    chat_url: String,
}

impl AssistantClient {
    pub fn new(base_url: &str) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AssistantError::Network(e.to_string()))?;
        Ok(Self {
            http,
            chat_url: format!("{}/api/chat", base_url.trim_end_matches('/')),
        })
    }

    pub async fn ask(&self, message: &str) -> Result<AssistantReply, AssistantError> {
        debug!(message, "sending chat request");

        let response = self
            .http
            .post(&self.chat_url)
            .json(&json!({ "message": message }))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    AssistantError::Timeout
                } else {
                    AssistantError::Network(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AssistantError::Decode(e.to_string()))?;

        parse_reply(&body)
    }
}

/// Decode one reply document. The reply message is required; layer data
/// and view position are optional and independently absent.
pub fn parse_reply(body: &Value) -> Result<AssistantReply, AssistantError> {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| AssistantError::Decode("reply has no message".to_string()))?
        .to_string();

    let collection = match body.get("layer_data") {
        None | Some(Value::Null) => None,
        Some(layer_data) => Some(
            FeatureCollection::from_value(layer_data)
                .map_err(|e| AssistantError::Decode(e.to_string()))?,
        ),
    };

    let view_position = body.get("view_position").and_then(parse_position);
    if body.get("view_position").is_some_and(|v| !v.is_null()) && view_position.is_none() {
        warn!("ignoring malformed view_position in assistant reply");
    }

    Ok(AssistantReply {
        message,
        collection,
        view_position,
    })
}

/// Positions arrive as `[lon, lat]`, but some backend paths emit a
/// `{longitude, latitude}` object; both are accepted.
fn parse_position(value: &Value) -> Option<LonLat> {
    if let Some(arr) = value.as_array() {
        if arr.len() == 2 {
            let pos = LonLat::new(arr[0].as_f64()?, arr[1].as_f64()?);
            return pos.is_finite().then_some(pos);
        }
        return None;
    }

    let obj = value.as_object()?;
    let pos = LonLat::new(
        obj.get("longitude")?.as_f64()?,
        obj.get("latitude")?.as_f64()?,
    );
    pos.is_finite().then_some(pos)
}

#[cfg(test)]
mod tests {
    use super::{parse_reply, AssistantError, Notification, NotificationKind};
    use foundation::LonLat;
    use serde_json::json;

    #[test]
    fn reply_with_layer_data_and_array_position() {
        let body = json!({
            "message": "Here are the earthquakes near Tokyo.",
            "layer_data": {
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [139.7, 35.7] },
                    "properties": { "magnitude": 5.1 }
                }],
                "metadata": { "layer_type": "earthquakes", "feature_count": 1, "source": "USGS" }
            },
            "view_position": [139.7, 35.7]
        });

        let reply = parse_reply(&body).unwrap();
        assert_eq!(reply.view_position, Some(LonLat::new(139.7, 35.7)));
        let fc = reply.collection.unwrap();
        assert_eq!(fc.metadata.feature_count, 1);

        let note = Notification::for_reply(&super::AssistantReply {
            message: reply.message,
            collection: Some(fc),
            view_position: reply.view_position,
        })
        .unwrap();
        assert_eq!(note.kind, NotificationKind::Success);
        assert_eq!(note.message, "Loaded 1 features from USGS");
    }

    #[test]
    fn reply_without_layer_data_is_just_a_message() {
        let body = json!({ "message": "I could not find data for that query." });
        let reply = parse_reply(&body).unwrap();
        assert!(reply.collection.is_none());
        assert!(reply.view_position.is_none());
        assert!(Notification::for_reply(&reply).is_none());
    }

    #[test]
    fn object_form_positions_are_accepted() {
        let body = json!({
            "message": "ok",
            "view_position": { "latitude": 55.7558, "longitude": 37.6173 }
        });
        let reply = parse_reply(&body).unwrap();
        assert_eq!(reply.view_position, Some(LonLat::new(37.6173, 55.7558)));
    }

    #[test]
    fn missing_message_is_a_decode_error() {
        let err = parse_reply(&json!({})).unwrap_err();
        assert!(matches!(err, AssistantError::Decode(_)));
    }

    #[test]
    fn error_notifications_are_readable() {
        let note = Notification::for_error(&AssistantError::Timeout);
        assert_eq!(note.kind, NotificationKind::Error);
        assert!(note.message.contains("timed out"));
    }
}
