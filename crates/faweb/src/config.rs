use serde::{Deserialize, Serialize};

/// Client configuration. Loading it from a file or CLI is the embedding
/// application's job; this is only the surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional proxy URL, `http://` or `socks5://`.
    #[serde(default)]
    pub proxy: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Minimum spacing between outbound requests, in seconds, enforced
    /// across all concurrent callers of one client.
    #[serde(default = "default_min_request_interval")]
    pub min_request_interval: f32,

    /// Overall per-request timeout, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: f32,

    /// Session cookies seeded into the jar at construction time.
    #[serde(default)]
    pub cookies: Vec<Cookie>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            proxy: None,
            user_agent: default_user_agent(),
            min_request_interval: default_min_request_interval(),
            request_timeout: default_request_timeout(),
            cookies: Vec::new(),
        }
    }
}

fn default_base_url() -> String {
    String::from("https://www.furaffinity.net")
}

fn default_user_agent() -> String {
    String::from("faweb")
}

fn default_min_request_interval() -> f32 {
    1.0
}

fn default_request_timeout() -> f32 {
    15.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"userAgent": "probe/1.0"}"#).unwrap();
        assert_eq!(config.user_agent, "probe/1.0");
        assert_eq!(config.base_url, "https://www.furaffinity.net");
        assert_eq!(config.min_request_interval, 1.0);
        assert!(config.cookies.is_empty());
        assert!(config.proxy.is_none());
    }

    #[test]
    fn cookies_deserialize() {
        let config: Config = serde_json::from_str(
            r#"{"cookies": [{"name": "a", "value": "s3cret"}]}"#,
        )
        .unwrap();
        assert_eq!(config.cookies.len(), 1);
        assert_eq!(config.cookies[0].name, "a");
    }
}
