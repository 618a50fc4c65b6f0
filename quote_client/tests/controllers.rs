//! Search and edit controllers sharing one quote list, driven with paused time.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quote_client::api::{RecordWriter, SearchSource};
use quote_client::debounce::shared;
use quote_client::failure::FailureLog;
use quote_client::notify::{Notification, Notifier, Severity};
use quote_client::{DebouncePolicy, DebouncedQuery, EditOutcome, OptimisticMutation};
use quote_common::aggregate::{success_by_author, total_by_author_fixed};
use quote_common::currency::{Currency, CurrencyTable};
use quote_common::{Quote, QuoteError};
use rust_decimal::Decimal;
use tokio::time::sleep;

/// In-memory stand-in for the quote API.
#[derive(Default)]
struct FakeApi {
    stored: Mutex<Vec<Quote>>,
    searches: Mutex<Vec<String>>,
    patches: Mutex<Vec<serde_json::Value>>,
    reject_writes: bool,
}

#[async_trait]
impl SearchSource<Quote> for FakeApi {
    async fn search(&self, text: &str) -> Result<Vec<Quote>, QuoteError> {
        self.searches.lock().unwrap().push(text.to_string());
        sleep(Duration::from_millis(50)).await;
        let stored = self.stored.lock().unwrap();
        Ok(stored
            .iter()
            .filter(|q| text.is_empty() || q.author.contains(text))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecordWriter<Quote> for FakeApi {
    async fn update(&self, record: &Quote) -> Result<(), QuoteError> {
        self.patches
            .lock()
            .unwrap()
            .push(serde_json::to_value(record)?);
        sleep(Duration::from_millis(200)).await;
        if self.reject_writes {
            return Err(QuoteError::Status(503));
        }
        let mut stored = self.stored.lock().unwrap();
        if let Some(q) = stored.iter_mut().find(|q| q.id == record.id) {
            *q = record.clone();
        }
        Ok(())
    }

    async fn create(&self, record: &Quote) -> Result<Quote, QuoteError> {
        Ok(record.clone())
    }
}

#[derive(Default)]
struct Toasts(Mutex<Vec<Notification>>);

impl Notifier for Toasts {
    fn notify(&self, n: Notification) {
        self.0.lock().unwrap().push(n);
    }
}

fn quote(id: u64, author: &str, total: &str, currency: Currency, order: bool) -> Quote {
    Quote {
        id,
        author: author.to_string(),
        total_price: total.parse().unwrap(),
        currency,
        order,
        ..Default::default()
    }
}

struct Harness {
    api: Arc<FakeApi>,
    toasts: Arc<Toasts>,
    search: DebouncedQuery<Quote>,
    editor: OptimisticMutation<Quote>,
}

fn harness(reject_writes: bool) -> Harness {
    let api = Arc::new(FakeApi {
        stored: Mutex::new(vec![
            quote(1, "ANA", "10", Currency::USD, true),
            quote(2, "ANA", "5", Currency::COP, false),
            quote(3, "LUIS", "2", Currency::EUR, false),
        ]),
        reject_writes,
        ..Default::default()
    });
    let toasts = Arc::new(Toasts::default());
    let listed = shared(Vec::new());
    let search = DebouncedQuery::new(
        "quotes",
        api.clone(),
        DebouncePolicy::new(1, Duration::from_millis(1500)),
        listed.clone(),
    );
    let editor = OptimisticMutation::new(listed, api.clone(), toasts.clone(), FailureLog::new());
    Harness {
        api,
        toasts,
        search,
        editor,
    }
}

fn listed_ids(h: &Harness) -> Vec<u64> {
    h.search.snapshot().iter().map(|q| q.id).collect()
}

#[tokio::test(start_paused = true)]
async fn initial_listing_then_debounced_search() {
    let h = harness(false);
    h.search.refresh().unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(listed_ids(&h), vec![1, 2, 3]);

    for text in ["L", "LU", "LUI"] {
        h.search.on_input(text).unwrap();
        sleep(Duration::from_millis(200)).await;
    }
    sleep(Duration::from_millis(2000)).await;
    assert_eq!(*h.api.searches.lock().unwrap(), vec!["", "LUI"]);
    assert_eq!(listed_ids(&h), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn edit_of_searched_quote_commits() {
    let h = harness(false);
    h.search.refresh().unwrap();
    sleep(Duration::from_millis(100)).await;

    let mut edited = h.search.snapshot()[0].clone();
    edited.total_price = Decimal::from(50);
    let outcome = h.editor.apply_edit(edited).await.unwrap();

    assert_eq!(outcome, EditOutcome::Committed);
    assert_eq!(h.search.snapshot()[0].total_price, Decimal::from(50));
    assert_eq!(h.api.stored.lock().unwrap()[0].total_price, Decimal::from(50));
    let toasts = h.toasts.0.lock().unwrap();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].severity, Severity::Success);
}

#[tokio::test(start_paused = true)]
async fn rejected_edit_reverts_the_list() {
    let h = harness(true);
    h.search.refresh().unwrap();
    sleep(Duration::from_millis(100)).await;

    let mut edited = h.search.snapshot()[0].clone();
    edited.total_price = Decimal::from(50);
    let outcome = h.editor.apply_edit(edited).await.unwrap();

    assert_eq!(outcome, EditOutcome::RolledBack { restored: true });
    assert_eq!(h.search.snapshot()[0].total_price, Decimal::from(10));
    assert_eq!(h.toasts.0.lock().unwrap()[0].severity, Severity::Error);
    assert_eq!(h.editor.failures().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn edit_of_unlisted_quote_sends_nothing() {
    let h = harness(false);
    h.search.refresh().unwrap();
    sleep(Duration::from_millis(100)).await;

    let err = h
        .editor
        .apply_edit(quote(999, "ANA", "1", Currency::COP, false))
        .await
        .unwrap_err();
    assert!(matches!(err, QuoteError::NotFound(999)));
    assert!(h.api.patches.lock().unwrap().is_empty());
    assert_eq!(listed_ids(&h), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn aggregates_over_fetched_list() {
    let h = harness(false);
    h.search.refresh().unwrap();
    sleep(Duration::from_millis(100)).await;

    let quotes = h.search.snapshot();
    let rates = CurrencyTable::empty()
        .with_rate(Currency::USD, Decimal::from(4000))
        .with_rate(Currency::COP, Decimal::ONE);
    assert_eq!(total_by_author_fixed(&quotes, "ANA", &rates).unwrap(), "40005.00");
    assert_eq!(success_by_author(&quotes, "ANA"), "50.00");
    assert_eq!(success_by_author(&quotes, "PEDRO"), "0.00");
}

#[tokio::test(start_paused = true)]
async fn patch_body_carries_fields_as_the_api_sent_them() {
    let h = harness(false);
    let legacy: Quote = serde_json::from_str(
        r#"{"id": 4, "author": "SOFIA", "totalPrice": "7", "status": "Archivada",
            "priority": "Urgente", "currency": "JPY", "notes": "sin IVA"}"#,
    )
    .unwrap();
    h.api.stored.lock().unwrap().push(legacy);
    h.search.refresh().unwrap();
    sleep(Duration::from_millis(100)).await;

    let mut edited = h.search.snapshot().into_iter().find(|q| q.id == 4).unwrap();
    edited.total_price = Decimal::from(70);
    let outcome = h.editor.apply_edit(edited).await.unwrap();
    assert_eq!(outcome, EditOutcome::Committed);

    let patches = h.api.patches.lock().unwrap();
    let body = &patches[0];
    assert_eq!(body["totalPrice"], "70");
    assert_eq!(body["status"], "Archivada");
    assert_eq!(body["priority"], "Urgente");
    assert_eq!(body["currency"], "JPY");
    assert_eq!(body["notes"], "sin IVA");
    for absent in ["client", "approvedBy", "createdAt"] {
        assert!(body.get(absent).is_none(), "{absent}");
    }
}
