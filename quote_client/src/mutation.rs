//! Optimistic mutation controller.
//!
//! `apply_edit` swaps the edited record into the shared collection right
//! away, then sends it to the API. A successful write keeps the new value; a
//! failed write puts the snapshot back, raises an error toast and appends to
//! the failure log. Nothing is retried.
//!
//! Edits are serialized per record id: a second edit of the same id waits for
//! the first to resolve and snapshots whatever the collection holds then,
//! which is always a confirmed or rolled-back value. Edits of different ids
//! run concurrently.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, error, info, warn};
use quote_common::record::ItemEdit;
use quote_common::{Quote, QuoteError, Record, RecordId};
use rust_decimal::Decimal;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::api::RecordWriter;
use crate::debounce::SharedCollection;
use crate::failure::FailureLog;
use crate::notify::{Notification, Notifier};

/// How an edit resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The API accepted the write; the new value stays.
    Committed,
    /// The API rejected the write. `restored` is false when the record had
    /// already left the collection, so there was nothing to put back.
    RolledBack {
        /// The snapshot was put back into the collection.
        restored: bool,
    },
}

type Gates = Mutex<HashMap<RecordId, Arc<AsyncMutex<()>>>>;

/// Exclusive turn to edit one id; unregisters the gate when nobody else waits.
struct EditTurn<'a> {
    gates: &'a Gates,
    id: RecordId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for EditTurn<'_> {
    fn drop(&mut self) {
        self.guard.take();
        if let Ok(mut gates) = self.gates.lock() {
            if gates.get(&self.id).is_some_and(|g| Arc::strong_count(g) == 1) {
                gates.remove(&self.id);
            }
        }
    }
}

/// Applies edits locally first and reconciles with the API.
pub struct OptimisticMutation<R: Record> {
    collection: SharedCollection<R>,
    writer: Arc<dyn RecordWriter<R>>,
    notifier: Arc<dyn Notifier>,
    failures: FailureLog,
    gates: Gates,
}

impl<R> OptimisticMutation<R>
where
    R: Record + Send + 'static,
{
    /// Controller editing `collection` through `writer`.
    pub fn new(
        collection: SharedCollection<R>,
        writer: Arc<dyn RecordWriter<R>>,
        notifier: Arc<dyn Notifier>,
        failures: FailureLog,
    ) -> Self {
        Self {
            collection,
            writer,
            notifier,
            failures,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Failed writes recorded so far.
    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }

    /// The collection this controller edits.
    pub fn collection(&self) -> SharedCollection<R> {
        Arc::clone(&self.collection)
    }

    async fn turn(&self, id: RecordId) -> Result<EditTurn<'_>, QuoteError> {
        let gate = {
            let mut gates = self.gates.lock()?;
            Arc::clone(gates.entry(id).or_default())
        };
        let guard = gate.lock_owned().await;
        Ok(EditTurn {
            gates: &self.gates,
            id,
            guard: Some(guard),
        })
    }

    /// Replaces the record with the same id optimistically and writes it.
    ///
    /// Returns `NotFound` without touching anything when the id is not in the
    /// collection. Remote failures are recovered here and reported through
    /// the returned outcome, the notifier and the failure log.
    pub async fn apply_edit(&self, record: R) -> Result<EditOutcome, QuoteError> {
        let id = record.id();
        let known = self.collection.lock()?.position(id).is_some();
        if !known {
            warn!("Edit ignored: record {} is not in the collection", id);
            return Err(QuoteError::NotFound(id));
        }

        let _turn = self.turn(id).await?;

        let snapshot = {
            let mut collection = self.collection.lock()?;
            let Some(position) = collection.position(id) else {
                warn!("Edit ignored: record {} left the collection", id);
                return Err(QuoteError::NotFound(id));
            };
            collection.replace_at(position, record.clone())?
        };
        debug!("Record {} updated optimistically", id);

        match self.writer.update(&record).await {
            Ok(()) => {
                info!("Record {} saved", id);
                self.notifier.notify(Notification::updated());
                Ok(EditOutcome::Committed)
            }
            Err(e) => {
                let restored = self.rollback(snapshot).unwrap_or_else(|err| {
                    error!("Rollback of record {} failed: {}", id, err);
                    false
                });
                self.notifier.notify(Notification::update_reverted());
                self.failures
                    .record(id, QuoteError::RemoteWrite(e.to_string()).to_string());
                Ok(EditOutcome::RolledBack { restored })
            }
        }
    }

    fn rollback(&self, snapshot: R) -> Result<bool, QuoteError> {
        let id = snapshot.id();
        let mut collection = self.collection.lock()?;
        match collection.position(id) {
            Some(position) => {
                collection.replace_at(position, snapshot)?;
                debug!("Record {} rolled back", id);
                Ok(true)
            }
            None => {
                warn!("Record {} no longer listed; rollback skipped", id);
                Ok(false)
            }
        }
    }

    /// Creates `record` remotely and adds the stored version to the collection.
    ///
    /// Not optimistic: the collection only changes after the API confirms.
    /// Returns `None` when the write failed.
    pub async fn create(&self, record: R) -> Result<Option<R>, QuoteError> {
        match self.writer.create(&record).await {
            Ok(created) => {
                info!("Record {} created", created.id());
                self.collection.lock()?.upsert(created.clone());
                self.notifier.notify(Notification::created());
                Ok(Some(created))
            }
            Err(e) => {
                self.notifier.notify(Notification::create_failed());
                self.failures
                    .record(record.id(), QuoteError::RemoteWrite(e.to_string()).to_string());
                Ok(None)
            }
        }
    }
}

impl OptimisticMutation<Quote> {
    /// Edits one item cell of a listed quote in place and refreshes its total.
    ///
    /// Local only; the change reaches the API with the next `apply_edit`.
    pub fn edit_item(
        &self,
        quote_id: RecordId,
        index: usize,
        edit: ItemEdit,
    ) -> Result<Decimal, QuoteError> {
        let mut collection = self.collection.lock()?;
        let quote = collection
            .get_mut(quote_id)
            .ok_or(QuoteError::NotFound(quote_id))?;
        quote.update_item(index, edit)?;
        Ok(quote.total_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::shared;
    use async_trait::async_trait;
    use quote_common::record::QuoteItem;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    use crate::notify::Severity;

    #[derive(Default)]
    struct RecordingNotifier(Mutex<Vec<Notification>>);

    impl RecordingNotifier {
        fn severities(&self) -> Vec<Severity> {
            self.0.lock().unwrap().iter().map(|n| n.severity).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, n: Notification) {
            self.0.lock().unwrap().push(n);
        }
    }

    /// Writer whose updates take `latency` and fail for ids in `failing`.
    #[derive(Default)]
    struct FakeWriter {
        calls: AtomicUsize,
        latency: Duration,
        failing: Vec<RecordId>,
        fail_create: bool,
    }

    #[async_trait]
    impl RecordWriter<Quote> for FakeWriter {
        async fn update(&self, record: &Quote) -> Result<(), QuoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            sleep(self.latency).await;
            if self.failing.contains(&record.id) {
                Err(QuoteError::Status(500))
            } else {
                Ok(())
            }
        }

        async fn create(&self, record: &Quote) -> Result<Quote, QuoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_create {
                return Err(QuoteError::Transport("connection refused".into()));
            }
            Ok(Quote {
                id: 100,
                ..record.clone()
            })
        }
    }

    fn quote(id: RecordId, price: i64) -> Quote {
        Quote {
            id,
            total_price: Decimal::from(price),
            ..Default::default()
        }
    }

    fn setup(
        writer: FakeWriter,
    ) -> (
        Arc<OptimisticMutation<Quote>>,
        Arc<FakeWriter>,
        Arc<RecordingNotifier>,
    ) {
        let writer = Arc::new(writer);
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = OptimisticMutation::new(
            shared(vec![quote(1, 10), quote(2, 20)]),
            writer.clone(),
            notifier.clone(),
            FailureLog::new(),
        );
        (Arc::new(controller), writer, notifier)
    }

    fn price(c: &OptimisticMutation<Quote>, id: RecordId) -> Decimal {
        c.collection().lock().unwrap().get(id).unwrap().total_price
    }

    #[tokio::test]
    async fn successful_write_commits() {
        let (c, writer, notifier) = setup(FakeWriter::default());
        let outcome = c.apply_edit(quote(1, 50)).await.unwrap();
        assert_eq!(outcome, EditOutcome::Committed);
        assert_eq!(price(&c, 1), Decimal::from(50));
        assert_eq!(notifier.severities(), vec![Severity::Success]);
        assert_eq!(writer.calls.load(Ordering::SeqCst), 1);
        assert!(c.failures().is_empty());
    }

    #[tokio::test]
    async fn failed_write_rolls_back() {
        let (c, _, notifier) = setup(FakeWriter {
            failing: vec![1],
            ..Default::default()
        });
        let outcome = c.apply_edit(quote(1, 50)).await.unwrap();
        assert_eq!(outcome, EditOutcome::RolledBack { restored: true });
        assert_eq!(price(&c, 1), Decimal::from(10));
        assert_eq!(c.collection().lock().unwrap().position(1), Some(0));
        assert_eq!(notifier.severities(), vec![Severity::Error]);
        let failures = c.failures().entries();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].record_id, 1);
    }

    #[tokio::test]
    async fn unknown_id_is_a_silent_no_op() {
        let (c, writer, notifier) = setup(FakeWriter::default());
        let err = c.apply_edit(quote(999, 1)).await.unwrap_err();
        assert!(matches!(err, QuoteError::NotFound(999)));
        assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
        assert!(notifier.severities().is_empty());
        assert_eq!(c.collection().lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn edit_is_visible_before_the_write_resolves() {
        let (c, _, _) = setup(FakeWriter {
            latency: Duration::from_secs(2),
            failing: vec![1],
            ..Default::default()
        });
        let task = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.apply_edit(quote(1, 50)).await }
        });
        sleep(Duration::from_millis(500)).await;
        assert_eq!(price(&c, 1), Decimal::from(50));

        task.await.unwrap().unwrap();
        assert_eq!(price(&c, 1), Decimal::from(10));
    }

    #[tokio::test(start_paused = true)]
    async fn same_id_edits_are_serialized() {
        let (c, _, notifier) = setup(FakeWriter {
            latency: Duration::from_secs(1),
            failing: vec![1],
            ..Default::default()
        });
        let first = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.apply_edit(quote(1, 50)).await }
        });
        sleep(Duration::from_millis(10)).await;
        let second = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.apply_edit(quote(1, 70)).await }
        });
        sleep(Duration::from_millis(100)).await;
        // The second edit waits its turn instead of stacking on the first.
        assert_eq!(price(&c, 1), Decimal::from(50));

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        // Both failed; the second snapshot was the rolled-back value.
        assert_eq!(price(&c, 1), Decimal::from(10));
        assert_eq!(notifier.severities(), vec![Severity::Error, Severity::Error]);
        assert!(c.gates.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn different_ids_proceed_concurrently() {
        let (c, _, _) = setup(FakeWriter {
            latency: Duration::from_secs(1),
            ..Default::default()
        });
        let started = tokio::time::Instant::now();
        let (a, b) = tokio::join!(c.apply_edit(quote(1, 11)), c.apply_edit(quote(2, 22)));
        assert_eq!(a.unwrap(), EditOutcome::Committed);
        assert_eq!(b.unwrap(), EditOutcome::Committed);
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn rollback_skipped_when_record_left_the_list() {
        let (c, _, notifier) = setup(FakeWriter {
            latency: Duration::from_secs(1),
            failing: vec![1],
            ..Default::default()
        });
        let task = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.apply_edit(quote(1, 50)).await }
        });
        sleep(Duration::from_millis(100)).await;
        c.collection().lock().unwrap().replace_all(vec![quote(3, 30)]);

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, EditOutcome::RolledBack { restored: false });
        assert!(c.collection().lock().unwrap().get(1).is_none());
        assert_eq!(notifier.severities(), vec![Severity::Error]);
        assert_eq!(c.failures().len(), 1);
    }

    #[tokio::test]
    async fn create_appends_only_after_confirmation() {
        let (c, _, notifier) = setup(FakeWriter::default());
        let created = c.create(quote(0, 5)).await.unwrap().unwrap();
        assert_eq!(created.id, 100);
        assert_eq!(c.collection().lock().unwrap().position(100), Some(2));
        assert_eq!(notifier.severities(), vec![Severity::Success]);

        let (c, _, notifier) = setup(FakeWriter {
            fail_create: true,
            ..Default::default()
        });
        assert!(c.create(quote(0, 5)).await.unwrap().is_none());
        assert_eq!(c.collection().lock().unwrap().len(), 2);
        assert_eq!(notifier.severities(), vec![Severity::Error]);
        assert_eq!(c.failures().len(), 1);
    }

    #[tokio::test]
    async fn item_edit_recomputes_total_locally() {
        let writer = Arc::new(FakeWriter::default());
        let c = OptimisticMutation::new(
            shared(vec![Quote {
                id: 1,
                items: vec![QuoteItem {
                    quantity: Decimal::from(2),
                    price: Decimal::from(10),
                    ..Default::default()
                }],
                ..Default::default()
            }]),
            writer.clone(),
            Arc::new(RecordingNotifier::default()),
            FailureLog::new(),
        );
        let total = c.edit_item(1, 0, ItemEdit::Price(Decimal::from(15))).unwrap();
        assert_eq!(total, Decimal::from(30));
        assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
        assert!(matches!(
            c.edit_item(2, 0, ItemEdit::Price(Decimal::ONE)),
            Err(QuoteError::NotFound(2))
        ));

        assert!(matches!(
            c.edit_item(1, 0, ItemEdit::Price(Decimal::MAX)),
            Err(QuoteError::Overflow(_))
        ));
        let listed = c.collection().lock().unwrap().to_vec();
        assert_eq!(listed[0].total_price, Decimal::from(30));
        assert_eq!(listed[0].items[0].price, Decimal::from(15));
    }
}
