use serde::Deserialize;

/// Submission body as the storefront sends it. Fields are optional and
/// enums stay strings so the handler can answer a precise 400 instead of a
/// generic 422. A body that is not JSON at all is still rejected by axum.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePreviewBody {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub photo_id: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub watermark: Option<bool>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub is_authenticated: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "requestId")]
    pub request_id: String,
}
