use std::fmt;
use std::time::{Duration, Instant};

/// Counters for one crawl, logged when the frontier drains
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub waves: usize,
    pub fetched: usize,
    pub failed: usize,
    pub items_yielded: usize,
    pub items_dropped: usize,
    started: Instant,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            waves: 0,
            fetched: 0,
            failed: 0,
            items_yielded: 0,
            items_dropped: 0,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Pages fetched successfully per second since the crawl started
    pub fn pages_per_sec(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.fetched as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} waves, {} fetched, {} failed, {} items yielded, {} dropped in {:?} ({:.2} pages/sec)",
            self.waves,
            self.fetched,
            self.failed,
            self.items_yielded,
            self.items_dropped,
            self.elapsed(),
            self.pages_per_sec()
        )
    }
}
