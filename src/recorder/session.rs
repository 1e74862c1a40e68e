use crate::analytics::classify::DIRECT;
use crate::models::{utc_date, VisitEvent};
use crate::recorder::environment::{split_location, Environment};

/// A page view in progress
///
/// The event is snapshotted when the view begins. It is completed twice: once
/// when the page finishes loading and once when the viewer leaves. Each step
/// hands back the full event to be saved.
#[derive(Debug, Clone)]
pub struct VisitSession {
    event: VisitEvent,
    started_at: i64,
}

impl VisitSession {
    pub fn begin(env: &dyn Environment) -> Self {
        let now = env.now_ms();
        let (path, query_params) = split_location(env.current_url());
        let referrer = env
            .referrer()
            .filter(|r| !r.is_empty())
            .unwrap_or(DIRECT)
            .to_string();

        let event = VisitEvent {
            timestamp: now,
            date: utc_date(now),
            referrer,
            user_agent: env.user_agent().to_string(),
            screen_size: env.screen_size().to_string(),
            language: env.language().to_string(),
            path,
            query_params,
            load_time: 0,
            time_on_page: None,
        };

        Self {
            event,
            started_at: now,
        }
    }

    pub fn event(&self) -> &VisitEvent {
        &self.event
    }

    /// Page finished loading after `load_time_ms`
    pub fn loaded(&mut self, load_time_ms: u64) -> VisitEvent {
        self.event.load_time = load_time_ms;
        self.event.clone()
    }

    /// Viewer left the page; time on page is whole seconds since [`begin`](Self::begin)
    pub fn unloaded(&mut self, env: &dyn Environment) -> VisitEvent {
        let elapsed_ms = env.now_ms().saturating_sub(self.started_at).max(0);
        self.event.time_on_page = Some((elapsed_ms / 1000) as u64);
        self.event.clone()
    }
}
