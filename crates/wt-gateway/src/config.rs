use std::env;
use std::str::FromStr;
use std::time::Duration;
use anyhow::{bail, Context};

/// Largest preview edge the renderer will allocate for.
pub const MAX_LONG_EDGE: u32 = 4096;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    /// When set, submissions must carry a matching `apikey` header.
    pub api_key: Option<String>,
    /// Base used when building `preview_url`s. Defaults to the bound address.
    pub public_url: Option<String>,
    /// Status reads before a job completes.
    pub polls_to_complete: u32,
    /// Render inline and answer `preview_url` from the submission itself.
    pub sync_responses: bool,
    pub prompt_ttl: Duration,
    /// Style ids whose jobs always end in `failed`.
    pub failing_styles: Vec<String>,
    pub long_edge: u32,
    pub job_retention: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            api_key: None,
            public_url: None,
            polls_to_complete: 3,
            sync_responses: false,
            prompt_ttl: Duration::from_secs(300),
            failing_styles: Vec::new(),
            long_edge: 512,
            job_retention: Duration::from_secs(3600),
        }
    }
}

impl GatewayConfig {
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let failing_styles = get("GATEWAY_FAILING_STYLES")
            .map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let long_edge = parse_or(&get, "GATEWAY_PREVIEW_LONG_EDGE", defaults.long_edge)?;
        if !(16..=MAX_LONG_EDGE).contains(&long_edge) {
            bail!("GATEWAY_PREVIEW_LONG_EDGE must be between 16 and {}, got {}", MAX_LONG_EDGE, long_edge);
        }

        Ok(Self {
            port: parse_or(&get, "PORT", defaults.port)?,
            api_key: get("GATEWAY_API_KEY"),
            public_url: get("GATEWAY_PUBLIC_URL").map(|url| url.trim_end_matches('/').to_string()),
            polls_to_complete: parse_or(&get, "GATEWAY_POLLS_TO_COMPLETE", defaults.polls_to_complete)?,
            sync_responses: parse_or(&get, "GATEWAY_SYNC_RESPONSES", defaults.sync_responses)?,
            prompt_ttl: Duration::from_secs(parse_or(&get, "GATEWAY_PROMPT_TTL_SECS", defaults.prompt_ttl.as_secs())?),
            failing_styles,
            long_edge,
            job_retention: Duration::from_secs(parse_or(&get, "GATEWAY_JOB_RETENTION_SECS", defaults.job_retention.as_secs())?),
        })
    }

    pub fn fails_style(&self, style_id: &str) -> bool {
        self.failing_styles.iter().any(|s| s.eq_ignore_ascii_case(style_id))
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, value)),
    }
}
