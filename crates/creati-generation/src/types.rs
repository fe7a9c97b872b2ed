use axum::{
    Json,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use creati_core::Kind;
use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Model,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One turn of a chat or code conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Validated generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kind: Kind,
    /// Never blank; for conversations this is the latest turn
    pub prompt: String,
    pub options: GenerationOptions,
}

/// Kind-specific request options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOptions {
    /// Full conversation, oldest turn first
    Conversation { turns: Vec<ChatMessage> },
    /// Number and size of images to generate
    Image { count: u32, width: u32, height: u32 },
    /// Prompt only
    Prompt,
}

/// A generated image addressed by data URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Binary media relayed verbatim from the upstream
#[derive(Debug, Clone)]
pub struct MediaPayload {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Normalized success payload returned to the client
#[derive(Debug, Clone)]
pub enum ClientEnvelope {
    /// `{ "message": ... }` for chat and code
    Message(String),
    /// `[{ "url": ... }]` for images
    Images(Vec<ImageUrl>),
    /// Raw body for music and video
    Media(MediaPayload),
}

#[derive(Serialize)]
struct MessageBody {
    message: String,
}

impl IntoResponse for ClientEnvelope {
    fn into_response(self) -> Response {
        match self {
            Self::Message(message) => Json(MessageBody { message }).into_response(),
            Self::Images(images) => Json(images).into_response(),
            Self::Media(MediaPayload { bytes, content_type }) => {
                let content_length = bytes.len().to_string();
                (
                    [
                        (http::header::CONTENT_TYPE, content_type),
                        (http::header::CONTENT_LENGTH, content_length),
                    ],
                    bytes,
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[test]
    fn assistant_is_accepted_as_model() {
        let message: ChatMessage = serde_json::from_str(r#"{"role":"assistant","content":"hello"}"#).unwrap();
        assert_eq!(message.role, Role::Model);
        assert_eq!(message.role.as_str(), "model");
    }

    #[tokio::test]
    async fn media_response_is_framed_by_its_bytes() {
        let payload = Bytes::from_static(b"RIFF\x00\x00WAVEfmt ");
        let response = ClientEnvelope::Media(MediaPayload {
            bytes: payload.clone(),
            content_type: "audio/wav".to_string(),
        })
        .into_response();

        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "audio/wav");
        assert_eq!(
            response.headers()[http::header::CONTENT_LENGTH],
            payload.len().to_string().as_str()
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, payload);
    }

    #[tokio::test]
    async fn images_serialize_as_a_bare_array() {
        let response = ClientEnvelope::Images(vec![ImageUrl {
            url: "data:image/jpeg;base64,AAAA".to_string(),
        }])
        .into_response();

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!([{ "url": "data:image/jpeg;base64,AAAA" }]));
    }
}
