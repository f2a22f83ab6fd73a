/// Crawl lifecycle definitions
///
/// A crawl moves `idle -> running -> (stopping) -> finished`, and the finish
/// carries the reason it ended.
use std::fmt;

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinishReason {
    // ===== Success =====
    /// The pagination locator found no further page
    NoMorePages,

    /// The configured page ceiling was reached
    PageLimit,

    // ===== Failure =====
    /// A stop request was observed at a checkpoint
    Stopped,

    /// The manual-intervention step was cancelled
    Cancelled,

    /// Navigation or extraction failed for the current page
    PageError,

    /// The renderer could not be launched
    SetupError,
}

impl FinishReason {
    /// Returns true if the crawl ran to a normal stopping condition
    pub fn is_success(&self) -> bool {
        matches!(self, Self::NoMorePages | Self::PageLimit)
    }

    /// Returns true if the user ended the crawl
    pub fn is_user_initiated(&self) -> bool {
        matches!(self, Self::Stopped | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoMorePages => "no_more_pages",
            Self::PageLimit => "page_limit",
            Self::Stopped => "stopped",
            Self::Cancelled => "cancelled",
            Self::PageError => "page_error",
            Self::SetupError => "setup_error",
        }
    }

    /// Human-readable status line for front ends
    pub fn status_line(&self) -> &'static str {
        if self.is_success() {
            "Scraping completed successfully"
        } else {
            "Scraping stopped or failed"
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents where a crawl is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlPhase {
    /// Not started yet
    #[default]
    Idle,

    /// Pages are being visited
    Running,

    /// A stop was observed; the renderer is being released
    Stopping,

    /// Ended, for the given reason
    Finished(FinishReason),
}

impl CrawlPhase {
    /// Checks whether the lifecycle allows moving from `self` to `to`
    pub fn can_transition_to(&self, to: CrawlPhase) -> bool {
        match (self, to) {
            (Self::Idle, Self::Running) => true,
            (Self::Running, Self::Stopping) => true,
            (Self::Running, Self::Finished(_)) => true,
            (Self::Stopping, Self::Finished(reason)) => reason.is_user_initiated(),
            _ => false,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Finished(reason) if reason.is_success() => write!(f, "finished(success: {})", reason),
            Self::Finished(reason) => write!(f, "finished(failure: {})", reason),
        }
    }
}
