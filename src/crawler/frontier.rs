//! Frontier queue and seen-URL set
//!
//! The frontier is owned by a single crawl. All growth goes through
//! `enqueue`, which is the one place the dedup rule is enforced.

use crate::http::Request;
use std::collections::{HashSet, VecDeque};

/// Pending requests plus the set of URLs ever enqueued
pub struct Frontier<I> {
    /// FIFO queue of requests waiting for a wave
    queue: VecDeque<Request<I>>,

    /// Every URL accepted so far (only filled when tracking)
    seen: HashSet<String>,

    /// When false, the same URL may be enqueued any number of times
    track_urls: bool,
}

impl<I> Frontier<I> {
    pub fn new(track_urls: bool) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            track_urls,
        }
    }

    /// Adds a request to the back of the queue
    ///
    /// With tracking on, a URL that was already enqueued once in this crawl
    /// is rejected. Tracking happens at enqueue time: whether the earlier
    /// fetch succeeded does not matter.
    ///
    /// # Returns
    ///
    /// `true` if the request was queued
    pub fn enqueue(&mut self, request: Request<I>) -> bool {
        if self.track_urls && !self.seen.insert(request.url().as_str().to_owned()) {
            tracing::trace!("Skipping already seen URL: {}", request.url());
            return false;
        }

        tracing::trace!("Enqueued {}", request.url());
        self.queue.push_back(request);
        true
    }

    /// Takes the requests for the next wave
    ///
    /// Without a cap, every request queued right now is taken; requests
    /// enqueued afterwards wait for the following wave. With a cap, at most
    /// `cap` requests are taken from the front and the rest keep their order.
    pub fn drain_wave(&mut self, cap: Option<usize>) -> Vec<Request<I>> {
        let take = cap.map_or(self.queue.len(), |cap| cap.min(self.queue.len()));
        self.queue.drain(..take).collect()
    }

    /// Returns the number of queued requests
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of distinct URLs accepted so far
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn track_urls(&self) -> bool {
        self.track_urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> Request<()> {
        Request::parse(url).unwrap()
    }

    fn urls(wave: &[Request<()>]) -> Vec<&str> {
        wave.iter().map(|r| r.url().as_str()).collect()
    }

    #[test]
    fn test_new_frontier() {
        let frontier = Frontier::<()>::new(true);
        assert!(frontier.is_empty());
        assert_eq!(frontier.len(), 0);
        assert_eq!(frontier.seen_count(), 0);
    }

    #[test]
    fn test_enqueue_tracks_urls() {
        let mut frontier = Frontier::new(true);

        assert!(frontier.enqueue(request("https://example.com/a")));
        assert!(!frontier.enqueue(request("https://example.com/a")));
        assert!(frontier.enqueue(request("https://example.com/b")));

        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.seen_count(), 2);
    }

    #[test]
    fn test_seen_survives_drain() {
        let mut frontier = Frontier::new(true);
        frontier.enqueue(request("https://example.com/a"));
        let wave = frontier.drain_wave(None);
        assert_eq!(wave.len(), 1);

        assert!(!frontier.enqueue(request("https://example.com/a")));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_enqueue_without_tracking() {
        let mut frontier = Frontier::new(false);

        assert!(frontier.enqueue(request("https://example.com/a")));
        assert!(frontier.enqueue(request("https://example.com/a")));

        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.seen_count(), 0);
    }

    #[test]
    fn test_drain_wave_takes_snapshot() {
        let mut frontier = Frontier::new(true);
        frontier.enqueue(request("https://example.com/a"));
        frontier.enqueue(request("https://example.com/b"));

        let wave = frontier.drain_wave(None);
        frontier.enqueue(request("https://example.com/c"));

        assert_eq!(urls(&wave), vec!["https://example.com/a", "https://example.com/b"]);
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_drain_wave_with_cap() {
        let mut frontier = Frontier::new(true);
        for path in ["a", "b", "c"] {
            frontier.enqueue(request(&format!("https://example.com/{}", path)));
        }

        let first = frontier.drain_wave(Some(2));
        let second = frontier.drain_wave(Some(2));

        assert_eq!(urls(&first), vec!["https://example.com/a", "https://example.com/b"]);
        assert_eq!(urls(&second), vec!["https://example.com/c"]);
        assert!(frontier.is_empty());
    }
}
