//! Fluent construction of a `Spider`
//!
//! The builder collects stage specs, the default callback and crawl settings,
//! then resolves the pipeline once in `build`. Unknown stage keys fail there,
//! before any URL is fetched.

use crate::config::{Config, UserAgentConfig};
use crate::crawler::{Callback, Context, Spider};
use crate::pipeline::{Pipeline, Stage, StageRegistry, StageSpec};
use crate::ConfigError;
use std::rc::Rc;
use std::time::Duration;

pub struct SpiderBuilder<I> {
    stages: Vec<StageSpec<I>>,
    registry: StageRegistry<I>,
    parse: Option<Callback<I>>,
    track_urls: bool,
    max_wave_size: Option<usize>,
    request_timeout: Duration,
    user_agent: Option<UserAgentConfig>,
    extra: toml::Table,
}

impl<I: 'static> Default for SpiderBuilder<I> {
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            registry: StageRegistry::new(),
            parse: None,
            track_urls: true,
            max_wave_size: None,
            request_timeout: Duration::from_secs(30),
            user_agent: None,
            extra: toml::Table::new(),
        }
    }
}

impl<I: 'static> SpiderBuilder<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a loaded configuration
    ///
    /// Pipeline keys are queued as named stages; they resolve against
    /// whichever registry is set by the time `build` runs.
    pub fn from_config(config: &Config) -> Self {
        let crawler = &config.crawler;
        let mut builder = Self {
            track_urls: crawler.track_urls,
            max_wave_size: crawler.max_wave_size,
            request_timeout: Duration::from_secs(crawler.request_timeout_secs),
            user_agent: Some(config.user_agent.clone()),
            extra: config.context.clone(),
            ..Self::default()
        };
        for key in &crawler.pipeline {
            builder = builder.named_stage(key.as_str());
        }
        builder
    }

    /// Sets the default callback for requests without their own
    pub fn parse(mut self, callback: Callback<I>) -> Self {
        self.parse = Some(callback);
        self
    }

    /// Appends a stage instance to the pipeline
    pub fn stage<S: Stage<I> + 'static>(mut self, stage: S) -> Self {
        self.stages.push(StageSpec::inline(stage));
        self
    }

    /// Appends a stage looked up by registry key at build time
    pub fn named_stage(mut self, key: impl Into<String>) -> Self {
        self.stages.push(StageSpec::named(key));
        self
    }

    /// Replaces the registry used to resolve named stages
    pub fn registry(mut self, registry: StageRegistry<I>) -> Self {
        self.registry = registry;
        self
    }

    /// Registers one more named stage constructor
    pub fn register_stage<F, S>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> S + 'static,
        S: Stage<I> + 'static,
    {
        self.registry.register(key, factory);
        self
    }

    pub fn track_urls(mut self, track_urls: bool) -> Self {
        self.track_urls = track_urls;
        self
    }

    /// Caps the number of fetches dispatched per wave
    pub fn max_wave_size(mut self, max_wave_size: usize) -> Self {
        self.max_wave_size = Some(max_wave_size);
        self
    }

    /// Timeout applied by the client a crawl builds for itself
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: UserAgentConfig) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Adds an extra value visible to stages through the context
    pub fn context_value(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Spider<I>, ConfigError> {
        if self.max_wave_size == Some(0) {
            return Err(ConfigError::Validation(
                "max_wave_size must be >= 1".to_string(),
            ));
        }

        let pipeline = Pipeline::build(self.stages, &self.registry)?;
        tracing::debug!(
            "Spider pipeline: [{}]",
            pipeline.stage_names().join(", ")
        );

        Ok(Spider {
            pipeline,
            parse: self.parse,
            context: Rc::new(Context::new(self.extra, self.track_urls)),
            max_wave_size: self.max_wave_size,
            request_timeout: self.request_timeout,
            user_agent: self.user_agent,
        })
    }
}
