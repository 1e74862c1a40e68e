//! Environment provider for visit capture

use std::sync::atomic::{AtomicI64, Ordering};

use url::Url;

/// What the collector can observe about the page being viewed
pub trait Environment: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;

    /// URL of the page being viewed, absolute or path-only
    fn current_url(&self) -> &str;

    fn user_agent(&self) -> &str;

    /// Referring page, if the browser reported one
    fn referrer(&self) -> Option<&str>;

    /// Viewport as `WIDTHxHEIGHT`
    fn screen_size(&self) -> &str;

    fn language(&self) -> &str;
}

/// Static description of a page view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub url: String,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub screen_size: String,
    pub language: String,
}

/// Environment over a fixed [`PageContext`] and an adjustable clock
#[derive(Debug)]
pub struct PageEnvironment {
    page: PageContext,
    now_ms: AtomicI64,
}

impl PageEnvironment {
    pub fn new(page: PageContext, now_ms: i64) -> Self {
        Self {
            page,
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Clock starts at the current system time
    pub fn starting_now(page: PageContext) -> Self {
        Self::new(page, chrono::Utc::now().timestamp_millis())
    }

    pub fn set_now(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Move the clock by `delta_ms`, saturating at the ends of the `i64` range
    pub fn advance(&self, delta_ms: i64) {
        let mut current = self.now_ms.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(delta_ms);
            match self.now_ms.compare_exchange_weak(
                current,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Environment for PageEnvironment {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn current_url(&self) -> &str {
        &self.page.url
    }

    fn user_agent(&self) -> &str {
        &self.page.user_agent
    }

    fn referrer(&self) -> Option<&str> {
        self.page.referrer.as_deref()
    }

    fn screen_size(&self) -> &str {
        &self.page.screen_size
    }

    fn language(&self) -> &str {
        &self.page.language
    }
}

/// Split a page URL into its path and query string (`?` included).
///
/// Absolute URLs are parsed; anything else is treated as a path with an
/// optional query and fragment.
pub fn split_location(url: &str) -> (String, String) {
    if let Ok(parsed) = Url::parse(url) {
        let query = parsed.query().map(|q| format!("?{q}")).unwrap_or_default();
        return (parsed.path().to_string(), query);
    }

    let without_fragment = url.split('#').next().unwrap_or_default();
    let (path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, format!("?{query}")),
        None => (without_fragment, String::new()),
    };
    let path = if path.is_empty() { "/" } else { path };
    let query = if query == "?" { String::new() } else { query };

    (path.to_string(), query)
}
