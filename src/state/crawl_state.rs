use crate::state::CrawlPhase;
use crate::SweepError;
use std::collections::HashSet;

/// Mutable state of one crawl, owned by the crawl worker
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    /// Page being processed, or the next one to load
    pub current_url: Option<String>,

    /// Pages fully processed (navigated, mined and persisted)
    pub pages_visited: u32,

    /// Consecutive pages that yielded no media
    pub pages_without_media: u32,

    /// Every link already handed to the result sink
    seen: HashSet<String>,

    phase: CrawlPhase,
}

impl CrawlState {
    /// Creates the state for a crawl beginning at `start_url`
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            current_url: Some(start_url.into()),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Moves to `to` if the lifecycle allows it
    pub fn advance(&mut self, to: CrawlPhase) -> Result<(), SweepError> {
        if !self.phase.can_transition_to(to) {
            return Err(SweepError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }

    /// Merges `found` into the seen-set and returns the links not seen before, sorted
    ///
    /// Links are compared as exact, case-sensitive strings.
    pub fn record_links<I>(&mut self, found: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut fresh: Vec<String> = found
            .into_iter()
            .filter(|link| self.seen.insert(link.clone()))
            .collect();
        fresh.sort();
        fresh
    }

    /// Number of unique links collected so far
    pub fn total_links(&self) -> usize {
        self.seen.len()
    }

    /// All unique links collected so far, sorted
    pub fn sorted_links(&self) -> Vec<String> {
        let mut links: Vec<String> = self.seen.iter().cloned().collect();
        links.sort();
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FinishReason;

    fn links(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_state() {
        let state = CrawlState::new("https://site.example/");
        assert_eq!(state.current_url.as_deref(), Some("https://site.example/"));
        assert_eq!(state.pages_visited, 0);
        assert_eq!(state.total_links(), 0);
        assert_eq!(state.phase(), CrawlPhase::Idle);
    }

    #[test]
    fn test_record_links_returns_only_new_sorted() {
        let mut state = CrawlState::new("https://site.example/");

        let first = state.record_links(links(&["https://b/2.mp4", "https://a/1.mp4"]));
        assert_eq!(first, links(&["https://a/1.mp4", "https://b/2.mp4"]));

        let second = state.record_links(links(&["https://a/1.mp4", "https://c/3.mp4"]));
        assert_eq!(second, links(&["https://c/3.mp4"]));
        assert_eq!(state.total_links(), 3);
    }

    #[test]
    fn test_record_links_is_case_sensitive() {
        let mut state = CrawlState::new("https://site.example/");
        state.record_links(links(&["https://a/X.mp4"]));
        let fresh = state.record_links(links(&["https://a/x.mp4"]));
        assert_eq!(fresh, links(&["https://a/x.mp4"]));
        assert_eq!(state.total_links(), 2);
    }

    #[test]
    fn test_record_links_dedupes_within_batch() {
        let mut state = CrawlState::new("https://site.example/");
        let fresh = state.record_links(links(&["https://a/1.mp4", "https://a/1.mp4"]));
        assert_eq!(fresh, links(&["https://a/1.mp4"]));
    }

    #[test]
    fn test_advance_follows_lifecycle() {
        let mut state = CrawlState::new("https://site.example/");
        assert!(state.advance(CrawlPhase::Running).is_ok());
        assert!(state.advance(CrawlPhase::Stopping).is_ok());
        assert!(state
            .advance(CrawlPhase::Finished(FinishReason::Stopped))
            .is_ok());
        assert_eq!(state.phase(), CrawlPhase::Finished(FinishReason::Stopped));
    }

    #[test]
    fn test_advance_rejects_invalid_transition() {
        let mut state = CrawlState::new("https://site.example/");
        let result = state.advance(CrawlPhase::Finished(FinishReason::NoMorePages));
        assert!(matches!(
            result,
            Err(SweepError::InvalidTransition { .. })
        ));
        assert_eq!(state.phase(), CrawlPhase::Idle);
    }
}
