use serde::Deserialize;

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    /// Extra values handed to pipeline stages through the crawl context
    #[serde(default)]
    pub context: toml::Table,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Whether a URL may be enqueued at most once per crawl
    #[serde(rename = "track-urls", default = "default_track_urls")]
    pub track_urls: bool,

    /// Maximum number of fetches dispatched in one wave (unbounded when unset)
    #[serde(rename = "max-wave-size", default)]
    pub max_wave_size: Option<usize>,

    /// Transport timeout for a single fetch, in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Stage registry keys, applied in order
    #[serde(default)]
    pub pipeline: Vec<String>,

    /// URLs to start crawling from
    #[serde(default)]
    pub seeds: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            track_urls: default_track_urls(),
            max_wave_size: None,
            request_timeout_secs: default_request_timeout_secs(),
            pipeline: Vec::new(),
            seeds: Vec::new(),
        }
    }
}

fn default_track_urls() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}
