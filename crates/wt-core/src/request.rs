use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::{PreviewError, Result};

/// Canvas orientations the generation backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:2")]
    Landscape,
    #[serde(rename = "2:3")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "3:2",
            Self::Portrait => "2:3",
        }
    }

    /// Pixel size of an image with this ratio whose longest edge is `long_edge`.
    pub fn dimensions(&self, long_edge: u32) -> (u32, u32) {
        // widened so the largest edges don't overflow; the result never exceeds `long_edge`
        let short_edge = (u64::from(long_edge) * 2 / 3) as u32;
        match self {
            Self::Square => (long_edge, long_edge),
            Self::Landscape => (long_edge, short_edge),
            Self::Portrait => (short_edge, long_edge),
        }
    }

    pub fn all() -> [AspectRatio; 3] {
        [Self::Square, Self::Landscape, Self::Portrait]
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = PreviewError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::all()
            .into_iter()
            .find(|ratio| ratio.as_str() == trimmed)
            .ok_or_else(|| PreviewError::Validation(format!("unsupported aspect ratio '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    High,
    #[default]
    Auto,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = PreviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "auto" => Ok(Self::Auto),
            _ => Err(PreviewError::Validation(format!("unsupported quality '{}'", s))),
        }
    }
}

/// Client-generated token the backend may use to deduplicate retried
/// submissions. Nothing in this crate enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// `{style}-{unix millis}-{iteration}`, the shape the storefront uses.
    pub fn for_attempt(style: &str, at: DateTime<Utc>, iteration: u32) -> Self {
        Self(format!("{}-{}-{}", style, at.timestamp_millis(), iteration))
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully validated preview generation request.
///
/// Only [`GenerationRequestBuilder`] can produce one, so every instance has a
/// non-empty image, style and key and a recognized aspect ratio. The
/// idempotency key travels as a header and is not part of the JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(rename = "imageUrl")]
    image_reference: String,
    #[serde(rename = "style")]
    style_identifier: String,
    photo_id: String,
    aspect_ratio: AspectRatio,
    watermark: bool,
    quality: Quality,
    is_authenticated: bool,
    #[serde(skip)]
    idempotency_key: IdempotencyKey,
}

impl GenerationRequest {
    pub fn builder(image_reference: impl Into<String>, style_identifier: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder::new(image_reference, style_identifier)
    }

    pub fn image_reference(&self) -> &str {
        &self.image_reference
    }

    pub fn style_identifier(&self) -> &str {
        &self.style_identifier
    }

    pub fn photo_id(&self) -> &str {
        &self.photo_id
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn watermark(&self) -> bool {
        self.watermark
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn idempotency_key(&self) -> &IdempotencyKey {
        &self.idempotency_key
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    image_reference: String,
    style_identifier: String,
    aspect_ratio: String,
    idempotency_key: Option<IdempotencyKey>,
    photo_id: Option<String>,
    watermark: bool,
    quality: Quality,
    is_authenticated: bool,
}

impl GenerationRequestBuilder {
    pub fn new(image_reference: impl Into<String>, style_identifier: impl Into<String>) -> Self {
        Self {
            image_reference: image_reference.into(),
            style_identifier: style_identifier.into(),
            aspect_ratio: AspectRatio::default().to_string(),
            idempotency_key: None,
            photo_id: None,
            watermark: true,
            quality: Quality::default(),
            is_authenticated: false,
        }
    }

    /// Accepts either an [`AspectRatio`] or its wire string; parsing happens in `build`.
    pub fn aspect_ratio(mut self, ratio: impl ToString) -> Self {
        self.aspect_ratio = ratio.to_string();
        self
    }

    pub fn idempotency_key(mut self, key: IdempotencyKey) -> Self {
        self.idempotency_key = Some(key);
        self
    }

    pub fn photo_id(mut self, photo_id: impl Into<String>) -> Self {
        self.photo_id = Some(photo_id.into());
        self
    }

    pub fn watermark(mut self, watermark: bool) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn authenticated(mut self, is_authenticated: bool) -> Self {
        self.is_authenticated = is_authenticated;
        self
    }

    pub fn build(self) -> Result<GenerationRequest> {
        let image_reference = self.image_reference.trim().to_string();
        if image_reference.is_empty() {
            return Err(PreviewError::Validation("an image is required".into()));
        }

        let style_identifier = self.style_identifier.trim().to_string();
        if style_identifier.is_empty() {
            return Err(PreviewError::Validation("a style is required".into()));
        }

        let aspect_ratio: AspectRatio = self.aspect_ratio.parse()?;

        let idempotency_key = self.idempotency_key.unwrap_or_else(IdempotencyKey::random);
        if idempotency_key.as_str().trim().is_empty() {
            return Err(PreviewError::Validation("idempotency key must not be empty".into()));
        }

        let photo_id = self
            .photo_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| idempotency_key.as_str().to_string());

        Ok(GenerationRequest {
            image_reference,
            style_identifier,
            photo_id,
            aspect_ratio,
            watermark: self.watermark,
            quality: self.quality,
            is_authenticated: self.is_authenticated,
            idempotency_key,
        })
    }
}
