use std::sync::Arc;

use axum::body::Body;
use bytes::Bytes;
use creati_core::{Kind, RequestContext};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{GenerationError, Result, error_response},
    server::Server,
    types::{ChatMessage, GenerationOptions, GenerationRequest},
};

const DEFAULT_IMAGE_AMOUNT: u32 = 2;
const DEFAULT_IMAGE_RESOLUTION: (u32, u32) = (512, 512);

const PROMPT_REQUIRED: &str = "Valid prompt is required";

/// Extractor yielding the request context and the unparsed body
///
/// The body is buffered up to the server's configured limit; the JSON is
/// only interpreted once the authentication and configuration gates pass.
pub struct ExtractGeneration(pub RequestContext, pub Bytes);

impl axum::extract::FromRequest<Arc<Server>> for ExtractGeneration {
    type Rejection = axum::response::Response;

    async fn from_request(request: http::Request<Body>, server: &Arc<Server>) -> std::result::Result<Self, Self::Rejection> {
        let (mut parts, body) = request.into_parts();
        let limit = server.body_limit();

        let bytes = axum::body::to_bytes(body, limit).await.map_err(|err| {
            if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
                error_response(
                    http::StatusCode::PAYLOAD_TOO_LARGE,
                    format!("Request body is too large, limit is {limit} bytes"),
                    None,
                )
            } else {
                error_response(
                    http::StatusCode::BAD_REQUEST,
                    format!("Failed to read request body: {err}"),
                    None,
                )
            }
        })?;

        let context = RequestContext {
            authentication: parts.extensions.remove().unwrap_or_default(),
            parts,
        };

        Ok(Self(context, bytes))
    }
}

#[derive(Deserialize)]
struct ConversationBody {
    #[serde(default)]
    messages: Option<Vec<ChatMessage>>,
}

#[derive(Deserialize)]
struct PromptBody {
    #[serde(default)]
    prompt: Option<Value>,
}

#[derive(Deserialize)]
struct ImageBody {
    #[serde(default)]
    prompt: Option<Value>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    resolution: Option<Value>,
}

/// Parse and validate a raw request body for the given kind
pub fn parse_request(kind: Kind, body: &[u8], max_images: u32) -> Result<GenerationRequest> {
    match kind {
        Kind::Chat | Kind::Code => parse_conversation(kind, body),
        Kind::Image => parse_image(body, max_images),
        Kind::Music | Kind::Video => {
            let parsed: PromptBody = decode(body)?;
            Ok(GenerationRequest {
                kind,
                prompt: required_prompt(parsed.prompt.as_ref())?,
                options: GenerationOptions::Prompt,
            })
        }
    }
}

fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| GenerationError::InvalidInput(format!("Invalid request body: {e}")))
}

fn required_prompt(value: Option<&Value>) -> Result<String> {
    value
        .and_then(Value::as_str)
        .filter(|prompt| !prompt.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| GenerationError::InvalidInput(PROMPT_REQUIRED.to_string()))
}

fn parse_conversation(kind: Kind, body: &[u8]) -> Result<GenerationRequest> {
    let parsed: ConversationBody = decode(body)?;

    let turns = parsed
        .messages
        .filter(|messages| !messages.is_empty())
        .ok_or_else(|| GenerationError::InvalidInput("At least one message is required".to_string()))?;

    let prompt = turns
        .last()
        .map(|message| message.content.clone())
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| GenerationError::InvalidInput("Latest message content is required".to_string()))?;

    Ok(GenerationRequest {
        kind,
        prompt,
        options: GenerationOptions::Conversation { turns },
    })
}

fn parse_image(body: &[u8], max_images: u32) -> Result<GenerationRequest> {
    let parsed: ImageBody = decode(body)?;

    let prompt = required_prompt(parsed.prompt.as_ref())?;
    let count = parse_amount(parsed.amount.as_ref(), max_images)?;
    let (width, height) = parse_resolution(parsed.resolution.as_ref())?;

    Ok(GenerationRequest {
        kind: Kind::Image,
        prompt,
        options: GenerationOptions::Image { count, width, height },
    })
}

/// `amount` may arrive as a string (form values) or a number
fn parse_amount(value: Option<&Value>, max_images: u32) -> Result<u32> {
    let invalid = || GenerationError::InvalidInput(format!("amount must be an integer between 1 and {max_images}"));

    let amount = match value {
        None | Some(Value::Null) => DEFAULT_IMAGE_AMOUNT.min(max_images),
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(invalid)?,
        Some(Value::String(text)) => text.trim().parse::<u32>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };

    if amount == 0 || amount > max_images {
        return Err(invalid());
    }

    Ok(amount)
}

fn parse_resolution(value: Option<&Value>) -> Result<(u32, u32)> {
    let invalid = || {
        GenerationError::InvalidInput("resolution must be <width>x<height> with positive integers".to_string())
    };

    let text = match value {
        None | Some(Value::Null) => return Ok(DEFAULT_IMAGE_RESOLUTION),
        Some(Value::String(text)) => text.trim(),
        Some(_) => return Err(invalid()),
    };

    let (width, height) = text.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<u32>().map_err(|_| invalid())?;

    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok((width, height))
}
