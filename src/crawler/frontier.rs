//! Breadth-first frontier and per-job visited set
//!
//! A URL is marked visited at the moment it is admitted to the frontier,
//! so a link discovered on two pages is only ever queued (and fetched) once.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized URL
    pub url: Url,
    /// Hop distance from the seed it was reached from; seeds are 0
    pub depth: u32,
}

/// Normalized URLs admitted to the frontier during one job
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a URL; returns false if it was already present
    pub fn insert(&mut self, url: &Url) -> bool {
        self.urls.insert(url.as_str().to_string())
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Result of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Depth is beyond the job's maximum
    TooDeep,
    /// URL was admitted earlier in this job
    AlreadySeen,
}

/// FIFO queue of URLs to fetch
///
/// Enqueue appends and dequeue pops the front, which gives breadth-first
/// order: depths come out non-decreasing.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: VisitedSet,
    max_depth: u32,
}

impl Frontier {
    pub fn new(max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: VisitedSet::new(),
            max_depth,
        }
    }

    /// Offers a normalized URL at the given depth
    pub fn enqueue(&mut self, url: Url, depth: u32) -> Admission {
        if depth > self.max_depth {
            return Admission::TooDeep;
        }

        if !self.visited.insert(&url) {
            return Admission::AlreadySeen;
        }

        self.queue.push_back(FrontierEntry { url, depth });
        Admission::Admitted
    }

    /// Removes and returns the front entry, or None when the frontier is empty
    pub fn dequeue(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.com{}", path)).unwrap()
    }

    #[test]
    fn test_breadth_first_order() {
        let mut frontier = Frontier::new(3);
        frontier.enqueue(url("/a"), 0);
        frontier.enqueue(url("/b"), 0);

        let first = frontier.dequeue().unwrap();
        assert_eq!(first.url, url("/a"));
        frontier.enqueue(url("/a/1"), first.depth + 1);

        let second = frontier.dequeue().unwrap();
        assert_eq!(second.url, url("/b"));
        frontier.enqueue(url("/b/1"), second.depth + 1);

        let order: Vec<(String, u32)> = std::iter::from_fn(|| frontier.dequeue())
            .map(|e| (e.url.path().to_string(), e.depth))
            .collect();
        assert_eq!(
            order,
            vec![("/a/1".to_string(), 1), ("/b/1".to_string(), 1)]
        );
    }

    #[test]
    fn test_rejects_entries_beyond_max_depth() {
        let mut frontier = Frontier::new(1);

        assert_eq!(frontier.enqueue(url("/a"), 1), Admission::Admitted);
        assert_eq!(frontier.enqueue(url("/b"), 2), Admission::TooDeep);
        assert_eq!(frontier.len(), 1);
        assert!(!frontier.visited().contains(&url("/b")));
    }

    #[test]
    fn test_rejects_duplicates_even_after_dequeue() {
        let mut frontier = Frontier::new(2);

        assert_eq!(frontier.enqueue(url("/a"), 0), Admission::Admitted);
        assert_eq!(frontier.enqueue(url("/a"), 1), Admission::AlreadySeen);

        frontier.dequeue();
        assert_eq!(frontier.enqueue(url("/a"), 1), Admission::AlreadySeen);
        assert!(frontier.is_empty());
        assert_eq!(frontier.visited().len(), 1);
    }

    #[test]
    fn test_zero_max_depth_admits_only_seeds() {
        let mut frontier = Frontier::new(0);

        assert_eq!(frontier.enqueue(url("/"), 0), Admission::Admitted);
        assert_eq!(frontier.enqueue(url("/child"), 1), Admission::TooDeep);
    }

    #[test]
    fn test_dequeue_empty() {
        let mut frontier = Frontier::new(2);
        assert!(frontier.dequeue().is_none());
    }
}
