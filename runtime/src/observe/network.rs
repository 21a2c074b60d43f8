//! Collects third-party and tracking domains from a page's outgoing requests.
//!
//! The observer is a passive tap: the request listener only updates in-memory
//! sets (and the optional recorder) and returns immediately.

use crate::observe::recorder::NetworkRecorder;
use crate::renderer::RequestListener;
use crate::tracking::{registrable_domain, TrackerRules};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Domains seen during one page session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedDomains {
    pub third_party: BTreeSet<String>,
    pub tracking: BTreeSet<String>,
    pub requests_seen: usize,
    pub network_log: Option<PathBuf>,
}

struct ObserverState {
    third_party: BTreeSet<String>,
    tracking: BTreeSet<String>,
    requests_seen: usize,
    recorder: Option<NetworkRecorder>,
}

/// Session-scoped request tap.
#[derive(Clone)]
pub struct NetworkObserver {
    page_domain: Arc<str>,
    rules: Arc<TrackerRules>,
    state: Arc<Mutex<ObserverState>>,
}

impl NetworkObserver {
    pub fn new(page_url: &str, rules: Arc<TrackerRules>, recorder: Option<NetworkRecorder>) -> Self {
        Self {
            page_domain: registrable_domain(page_url).into(),
            rules,
            state: Arc::new(Mutex::new(ObserverState {
                third_party: BTreeSet::new(),
                tracking: BTreeSet::new(),
                requests_seen: 0,
                recorder,
            })),
        }
    }

    /// Listener to hand to the browsing context before navigation.
    pub fn listener(&self) -> RequestListener {
        let observer = self.clone();
        Arc::new(move |url: &str| observer.record(url))
    }

    /// Account for one outgoing request.
    pub fn record(&self, url: &str) {
        let domain = registrable_domain(url);
        if domain.is_empty() {
            // data:, blob:, about: and friends carry no authority.
            return;
        }
        let third_party = domain != *self.page_domain;
        let tracking = self.rules.is_tracking(url);

        let mut state = self.lock();
        state.requests_seen += 1;
        if third_party {
            state.third_party.insert(domain.clone());
        }
        if tracking {
            debug!("tracking request: {url}");
            state.tracking.insert(domain.clone());
        }
        if let Some(recorder) = state.recorder.as_mut() {
            if let Err(e) = recorder.log(url, &domain, third_party, tracking) {
                warn!("network log write failed, disabling recorder: {e}");
                state.recorder = None;
            }
        }
    }

    /// Current view without ending the session.
    pub fn snapshot(&self) -> ObservedDomains {
        let state = self.lock();
        ObservedDomains {
            third_party: state.third_party.clone(),
            tracking: state.tracking.clone(),
            requests_seen: state.requests_seen,
            network_log: None,
        }
    }

    /// Stop recording and return everything observed. Later requests are
    /// still counted by stray listener clones but no longer logged.
    pub fn finish(&self) -> ObservedDomains {
        let mut state = self.lock();
        let network_log = state.recorder.take().and_then(|recorder| match recorder.finish() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("failed to finalize network log: {e}");
                None
            }
        });
        ObservedDomains {
            third_party: state.third_party.clone(),
            tracking: state.tracking.clone(),
            requests_seen: state.requests_seen,
            network_log,
        }
    }

    pub fn page_domain(&self) -> &str {
        &self.page_domain
    }

    fn lock(&self) -> MutexGuard<'_, ObserverState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer(page: &str) -> NetworkObserver {
        NetworkObserver::new(page, Arc::new(TrackerRules::default()), None)
    }

    #[test]
    fn test_third_party_dedup_by_domain() {
        let obs = observer("https://www.example.com/");
        obs.record("https://example.com/app.js");
        obs.record("https://www.example.com/style.css");
        obs.record("https://cdn.other.net/a.js");
        obs.record("https://cdn.other.net/b.js?v=2");
        obs.record("https://fonts.gstatic.com/s/roboto.woff2");

        let seen = obs.snapshot();
        assert_eq!(seen.requests_seen, 5);
        assert_eq!(
            seen.third_party.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["cdn.other.net", "fonts.gstatic.com"]
        );
        assert!(seen.tracking.is_empty());
    }

    #[test]
    fn test_first_party_tracking_is_still_tracking() {
        let obs = observer("https://example.com/");
        obs.record("https://example.com/collect?v=1");
        obs.record("https://www.google-analytics.com/g/collect");

        let seen = obs.snapshot();
        assert!(seen.tracking.contains("example.com"));
        assert!(seen.tracking.contains("google-analytics.com"));
        assert!(!seen.third_party.contains("example.com"));
        assert!(seen.third_party.contains("google-analytics.com"));
    }

    #[test]
    fn test_listener_feeds_shared_state() {
        let obs = observer("https://example.com/");
        let listener = obs.listener();
        listener("https://ads.tracker.io/x.js");
        listener("data:image/png;base64,AAAA");

        let seen = obs.finish();
        assert_eq!(seen.requests_seen, 1);
        assert!(seen.third_party.contains("ads.tracker.io"));
        assert!(seen.tracking.contains("ads.tracker.io"));
        assert!(seen.network_log.is_none());
    }

    #[test]
    fn test_finish_flushes_recorder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.jsonl");
        let recorder = NetworkRecorder::create(&path).unwrap();
        let obs = NetworkObserver::new(
            "https://example.com/",
            Arc::new(TrackerRules::default()),
            Some(recorder),
        );
        obs.record("https://connect.facebook.net/en_US/fbevents.js");

        let seen = obs.finish();
        assert_eq!(seen.network_log.as_deref(), Some(path.as_path()));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("connect.facebook.net"));
    }
}
