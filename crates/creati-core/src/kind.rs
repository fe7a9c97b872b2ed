use serde::{Deserialize, Serialize};

/// Category of generation request, selecting the upstream provider
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Kind {
    /// Conversational text
    Chat,
    /// Code assistant text with a formatting instruction
    Code,
    /// Still images
    Image,
    /// Audio clips
    Music,
    /// Video clips
    Video,
}

impl Kind {
    /// Human-readable label used in client error messages
    pub const fn label(self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::Code => "Code",
            Self::Image => "Image",
            Self::Music => "Music",
            Self::Video => "Video",
        }
    }
}
