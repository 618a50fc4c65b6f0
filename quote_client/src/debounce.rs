//! Debounced remote query controller.
//!
//! `DebouncedQuery::on_input` is called on every keystroke. It keeps at most one
//! armed timer per input source: arming a new timer first cancels the previous
//! one, and dropping the controller cancels whatever is still armed. When a
//! timer fires, one remote read is issued and the displayed result set is
//! replaced with the response (or emptied on failure).
//!
//! Responses may resolve out of order. Each issued request captures a
//! generation number and its response is applied only while that generation
//! is still the latest, so a late answer for a superseded query never
//! overwrites fresher results.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, warn};
use quote_common::{Collection, QuoteError, Record};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::api::SearchSource;

/// Collection shared between a controller and its readers.
pub type SharedCollection<T> = Arc<Mutex<Collection<T>>>;

/// Wraps `records` for sharing between controllers and views.
pub fn shared<T: Record>(records: Vec<T>) -> SharedCollection<T> {
    Arc::new(Mutex::new(Collection::from_records(records)))
}

/// Minimum input length and quiet period for one input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    /// Inputs with fewer characters clear the results and schedule nothing.
    pub min_len: usize,
    /// Quiet period measured from the most recent input.
    pub delay: Duration,
}

impl DebouncePolicy {
    /// Quote search box.
    pub const SEARCH: DebouncePolicy = DebouncePolicy {
        min_len: 1,
        delay: Duration::from_millis(1500),
    };

    /// Client/product/unit autocomplete fields.
    pub const SUGGEST: DebouncePolicy = DebouncePolicy {
        min_len: 2,
        delay: Duration::from_millis(1000),
    };

    /// Policy with the given minimum length and quiet period.
    pub fn new(min_len: usize, delay: Duration) -> Self {
        Self { min_len, delay }
    }
}

/// An armed timer; aborted when dropped.
struct ScheduledTask(JoinHandle<()>);

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Debug, Default)]
struct QueryState {
    latest: String,
    /// Bumped whenever a timer is armed; a timer only fires if its ticket is current.
    ticket: u64,
    /// Bumped whenever a request is issued or results are cleared.
    generation: u64,
}

struct Inner<T: Record> {
    name: &'static str,
    source: Arc<dyn SearchSource<T>>,
    results: SharedCollection<T>,
    state: Mutex<QueryState>,
}

impl<T> Inner<T>
where
    T: Record + Send + 'static,
{
    /// Issues one remote read for `text` and applies its response if still current.
    fn issue(self: &Arc<Self>, text: String) -> Result<u64, QuoteError> {
        let generation = {
            let mut state = self.state.lock()?;
            state.generation += 1;
            state.generation
        };
        debug!("[{}] issuing request #{} for {:?}", self.name, generation, text);

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = inner.source.search(&text).await;
            if let Err(e) = inner.apply(generation, outcome) {
                error!("[{}] failed to apply response #{}: {}", inner.name, generation, e);
            }
        });
        Ok(generation)
    }

    fn apply(
        &self,
        generation: u64,
        outcome: Result<Vec<T>, QuoteError>,
    ) -> Result<bool, QuoteError> {
        let state = self.state.lock()?;
        if state.generation != generation {
            debug!(
                "[{}] discarding stale response #{} (latest #{})",
                self.name, generation, state.generation
            );
            return Ok(false);
        }

        let mut results = self.results.lock()?;
        match outcome {
            Ok(records) => {
                debug!("[{}] response #{}: {} records", self.name, generation, records.len());
                results.replace_all(records);
            }
            Err(e) => {
                warn!("[{}] {}", self.name, QuoteError::RemoteRead(e.to_string()));
                results.clear();
            }
        }
        Ok(true)
    }

    /// Fires an armed timer unless it was superseded meanwhile.
    fn fire(self: &Arc<Self>, ticket: u64) -> Result<(), QuoteError> {
        let text = {
            let state = self.state.lock()?;
            if state.ticket != ticket {
                return Ok(());
            }
            state.latest.clone()
        };
        self.issue(text).map(|_| ())
    }
}

/// Debounced remote query for one input source.
///
/// Must be driven from inside a tokio runtime.
pub struct DebouncedQuery<T: Record> {
    inner: Arc<Inner<T>>,
    policy: DebouncePolicy,
    pending: Mutex<Option<ScheduledTask>>,
}

impl<T> DebouncedQuery<T>
where
    T: Record + Send + 'static,
{
    /// Controller that writes responses into `results`.
    pub fn new(
        name: &'static str,
        source: Arc<dyn SearchSource<T>>,
        policy: DebouncePolicy,
        results: SharedCollection<T>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                source,
                results,
                state: Mutex::new(QueryState::default()),
            }),
            policy,
            pending: Mutex::new(None),
        }
    }

    /// Records a new input value and (re)arms the debounce timer.
    pub fn on_input(&self, text: &str) -> Result<(), QuoteError> {
        let mut pending = self.pending.lock()?;
        // Cancel before arming; dropping the task aborts it.
        pending.take();

        let ticket = {
            let mut state = self.inner.state.lock()?;
            state.latest = text.to_string();
            state.ticket += 1;
            if text.chars().count() < self.policy.min_len {
                state.generation += 1;
                None
            } else {
                Some(state.ticket)
            }
        };

        let Some(ticket) = ticket else {
            debug!("[{}] input below {} chars, clearing", self.inner.name, self.policy.min_len);
            self.inner.results.lock()?.clear();
            return Ok(());
        };

        let inner = Arc::clone(&self.inner);
        let delay = self.policy.delay;
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            if let Err(e) = inner.fire(ticket) {
                error!("[{}] debounce timer failed: {}", inner.name, e);
            }
        });
        *pending = Some(ScheduledTask(handle));
        Ok(())
    }

    /// Issues a request for the latest input right away, skipping the quiet
    /// period and the length check. Used for the initial full listing.
    pub fn refresh(&self) -> Result<u64, QuoteError> {
        self.cancel()?;
        let text = {
            let mut state = self.inner.state.lock()?;
            state.ticket += 1;
            state.latest.clone()
        };
        self.inner.issue(text)
    }

    /// Cancels the armed timer, if any. Requests already issued still complete.
    pub fn cancel(&self) -> Result<(), QuoteError> {
        self.pending.lock()?.take();
        Ok(())
    }

    /// `true` while a timer is armed and has not fired yet.
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|p| p.as_ref().is_some_and(|task| !task.0.is_finished()))
            .unwrap_or(false)
    }

    /// Latest input value.
    pub fn latest_text(&self) -> String {
        self.inner
            .state
            .lock()
            .map(|s| s.latest.clone())
            .unwrap_or_default()
    }

    /// Generation of the most recently issued request.
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().map(|s| s.generation).unwrap_or(0)
    }

    /// Handle to the displayed result set.
    pub fn results(&self) -> SharedCollection<T> {
        Arc::clone(&self.inner.results)
    }

    /// Copy of the displayed results.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner
            .results
            .lock()
            .map(|c| c.to_vec())
            .unwrap_or_default()
    }
}
