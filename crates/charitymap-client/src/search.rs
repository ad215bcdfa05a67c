//! Debounced server-side search.
//!
//! Every keystroke calls [`SearchScheduler::schedule`]. The request is held
//! for the debounce window; a newer keystroke aborts it before it fires, so
//! only the query the user paused on reaches the backend. Requests that have
//! already fired are never cancelled. Instead each one carries a sequence
//! number, and only the outcome for the latest issued number is current.

use crate::source::ProjectSource;
use async_channel::{unbounded, Receiver, Sender};
use charitymap_core::error::ApiError;
use charitymap_core::types::Project;
use metrics::counter;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Field a search is restricted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchColumn {
    #[default]
    All,
    Name,
    Category,
    Status,
    County,
    Subcounty,
    TargetIndividual,
    Description,
}

impl SearchColumn {
    pub const ALL: [SearchColumn; 8] = [
        SearchColumn::All,
        SearchColumn::Name,
        SearchColumn::Category,
        SearchColumn::Status,
        SearchColumn::County,
        SearchColumn::Subcounty,
        SearchColumn::TargetIndividual,
        SearchColumn::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchColumn::All => "all",
            SearchColumn::Name => "name",
            SearchColumn::Category => "category",
            SearchColumn::Status => "status",
            SearchColumn::County => "county",
            SearchColumn::Subcounty => "subcounty",
            SearchColumn::TargetIndividual => "target_individual",
            SearchColumn::Description => "description",
        }
    }

    /// Query-string parameter carrying the search text.
    pub fn query_param(&self) -> &'static str {
        match self {
            SearchColumn::All => "search",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for SearchColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchColumn::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown search column: {}", s))
    }
}

/// A free-text query against one column (or all of them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub column: SearchColumn,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, column: SearchColumn) -> Self {
        Self {
            text: text.into(),
            column,
        }
    }

    /// Empty or whitespace-only queries mean "no search".
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Trimmed search text.
    pub fn term(&self) -> &str {
        self.text.trim()
    }

    /// Case-insensitive substring match using backend column semantics.
    pub fn matches(&self, project: &Project) -> bool {
        if self.is_blank() {
            return false;
        }
        let needle = self.term().to_lowercase();
        let hit = |value: Option<&str>| value.is_some_and(|v| v.to_lowercase().contains(&needle));

        match self.column {
            SearchColumn::Name => hit(Some(&project.name)),
            SearchColumn::Category => hit(Some(project.category.as_str())),
            SearchColumn::Status => hit(Some(project.status.as_str())),
            SearchColumn::County => hit(project.county.as_deref()),
            SearchColumn::Subcounty => hit(project.subcounty.as_deref()),
            SearchColumn::TargetIndividual => hit(project.target_individual.as_deref()),
            SearchColumn::Description => hit(project.description.as_deref()),
            SearchColumn::All => [
                Some(project.name.as_str()),
                Some(project.category.as_str()),
                Some(project.status.as_str()),
                project.county.as_deref(),
                project.subcounty.as_deref(),
                project.target_individual.as_deref(),
                project.description.as_deref(),
            ]
            .into_iter()
            .any(hit),
        }
    }
}

/// Monotonic sequence numbers for issued searches.
#[derive(Debug, Default)]
pub struct SearchSequence {
    latest: AtomicU64,
}

impl SearchSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next number. The first issued number is 1.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// True if `seq` is the most recently issued number.
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest()
    }
}

/// Completion of one fired search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub seq: u64,
    pub query: SearchQuery,
    pub result: Result<Vec<Project>, ApiError>,
}

/// Debounces queries and runs them against a [`ProjectSource`].
///
/// Must be used from within a tokio runtime.
pub struct SearchScheduler {
    source: Arc<dyn ProjectSource>,
    debounce: Duration,
    sequence: Arc<SearchSequence>,
    pending: Mutex<Option<JoinHandle<()>>>,
    outcome_tx: Sender<SearchOutcome>,
    outcome_rx: Receiver<SearchOutcome>,
}

impl SearchScheduler {
    pub fn new(source: Arc<dyn ProjectSource>, debounce: Duration) -> Self {
        let (outcome_tx, outcome_rx) = unbounded();
        Self {
            source,
            debounce,
            sequence: Arc::new(SearchSequence::new()),
            pending: Mutex::new(None),
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Schedules `query` after the debounce window, replacing any search that
    /// has not fired yet. Returns the sequence number assigned to it.
    pub fn schedule(&self, query: SearchQuery) -> u64 {
        let seq = self.sequence.issue();
        let source = Arc::clone(&self.source);
        let tx = self.outcome_tx.clone();
        let debounce = self.debounce;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            // Detached so a later keystroke cannot cancel an in-flight request.
            tokio::spawn(async move {
                counter!("charitymap_search_requests_total").increment(1);
                debug!(seq, query = %query.text, column = %query.column, "Sending search");
                let result = source.search(&query).await;
                if let Err(e) = &result {
                    warn!(seq, error = %e, "Search request failed");
                }
                let _ = tx.send(SearchOutcome { seq, query, result }).await;
            });
        });

        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }

        seq
    }

    /// Drops any search that has not fired yet and invalidates every issued
    /// one. Used when the query is cleared.
    pub fn cancel(&self) -> u64 {
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }
        self.sequence.issue()
    }

    /// True if `outcome` answers the most recent query. Stale outcomes are
    /// counted and should be dropped by the caller.
    pub fn is_current(&self, outcome: &SearchOutcome) -> bool {
        let current = self.sequence.is_current(outcome.seq);
        if !current {
            counter!("charitymap_search_stale_responses_total").increment(1);
            debug!(
                seq = outcome.seq,
                latest = self.sequence.latest(),
                "Discarding stale search response"
            );
        }
        current
    }

    /// Next completed search, if one is ready.
    pub fn try_recv(&self) -> Option<SearchOutcome> {
        self.outcome_rx.try_recv().ok()
    }

    /// Waits for the next completed search.
    pub async fn recv(&self) -> Option<SearchOutcome> {
        self.outcome_rx.recv().await.ok()
    }

    pub fn latest_seq(&self) -> u64 {
        self.sequence.latest()
    }
}

impl Drop for SearchScheduler {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use charitymap_core::types::{ProjectCategory, ProjectStatus};

    /// Records every query it receives; optionally delays per query text.
    #[derive(Default)]
    struct RecordingSource {
        calls: Mutex<Vec<SearchQuery>>,
        delays: Vec<(String, Duration)>,
    }

    #[async_trait]
    impl ProjectSource for RecordingSource {
        async fn fetch_all(&self) -> Result<Vec<Project>, ApiError> {
            Ok(Vec::new())
        }

        async fn search(&self, query: &SearchQuery) -> Result<Vec<Project>, ApiError> {
            self.calls.lock().push(query.clone());
            if let Some((_, delay)) = self.delays.iter().find(|(t, _)| *t == query.text) {
                tokio::time::sleep(*delay).await;
            }
            Ok(vec![Project::new(
                1,
                query.text.clone(),
                ProjectStatus::Pending,
                ProjectCategory::Other,
            )])
        }
    }

    #[test]
    fn test_column_params() {
        assert_eq!(SearchColumn::All.query_param(), "search");
        assert_eq!(SearchColumn::TargetIndividual.query_param(), "target_individual");
        assert_eq!("County".parse::<SearchColumn>().unwrap(), SearchColumn::County);
        assert!("budget".parse::<SearchColumn>().is_err());
    }

    #[test]
    fn test_blank_queries() {
        assert!(SearchQuery::new("", SearchColumn::All).is_blank());
        assert!(SearchQuery::new("  \t", SearchColumn::Name).is_blank());
        assert!(!SearchQuery::new(" a ", SearchColumn::Name).is_blank());
        assert_eq!(SearchQuery::new(" a ", SearchColumn::Name).term(), "a");
    }

    #[test]
    fn test_sequence() {
        let seq = SearchSequence::new();
        assert_eq!(seq.issue(), 1);
        assert_eq!(seq.issue(), 2);
        assert!(seq.is_current(2));
        assert!(!seq.is_current(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_sends_one_request() {
        let source = Arc::new(RecordingSource::default());
        let scheduler = SearchScheduler::new(source.clone(), Duration::from_millis(300));

        scheduler.schedule(SearchQuery::new("a", SearchColumn::All));
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.schedule(SearchQuery::new("ab", SearchColumn::All));
        tokio::time::sleep(Duration::from_millis(100)).await;
        let last = scheduler.schedule(SearchQuery::new("abc", SearchColumn::All));

        let outcome = scheduler.recv().await.unwrap();
        assert_eq!(outcome.seq, last);
        assert_eq!(outcome.query.text, "abc");
        assert!(scheduler.is_current(&outcome));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let calls = source.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text, "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pauses_longer_than_window_send_each_query() {
        let source = Arc::new(RecordingSource::default());
        let scheduler = SearchScheduler::new(source.clone(), Duration::from_millis(300));

        scheduler.schedule(SearchQuery::new("a", SearchColumn::All));
        tokio::time::sleep(Duration::from_millis(400)).await;
        scheduler.schedule(SearchQuery::new("ab", SearchColumn::All));
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(source.calls.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_not_current() {
        let source = Arc::new(RecordingSource {
            calls: Mutex::new(Vec::new()),
            delays: vec![("slow".to_string(), Duration::from_secs(5))],
        });
        let scheduler = SearchScheduler::new(source.clone(), Duration::from_millis(300));

        let slow = scheduler.schedule(SearchQuery::new("slow", SearchColumn::All));
        tokio::time::sleep(Duration::from_millis(400)).await;
        let fast = scheduler.schedule(SearchQuery::new("fast", SearchColumn::All));

        let first = scheduler.recv().await.unwrap();
        assert_eq!(first.seq, fast);
        assert!(scheduler.is_current(&first));

        let second = scheduler.recv().await.unwrap();
        assert_eq!(second.seq, slow);
        assert!(!scheduler.is_current(&second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_search() {
        let source = Arc::new(RecordingSource::default());
        let scheduler = SearchScheduler::new(source.clone(), Duration::from_millis(300));

        scheduler.schedule(SearchQuery::new("abc", SearchColumn::All));
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(source.calls.lock().is_empty());
        assert!(scheduler.try_recv().is_none());
    }
}
