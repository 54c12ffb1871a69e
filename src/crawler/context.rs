/// Read-only values shared with every pipeline stage during a crawl
///
/// The extra values come from the `[context]` table of the configuration or
/// from `SpiderBuilder::context_value`; they are kept apart from the
/// spider's own settings.
#[derive(Debug, Clone, Default)]
pub struct Context {
    extra: toml::Table,
    track_urls: bool,
}

impl Context {
    pub fn new(extra: toml::Table, track_urls: bool) -> Self {
        Self { extra, track_urls }
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.extra.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(toml::Value::as_str)
    }

    pub fn extra(&self) -> &toml::Table {
        &self.extra
    }

    /// Whether the crawl this context belongs to deduplicates URLs
    pub fn track_urls(&self) -> bool {
        self.track_urls
    }

}
