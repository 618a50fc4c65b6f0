//! Remote quote API.
//!
//! Controllers depend on the two collaborator traits, `SearchSource` for reads
//! and `RecordWriter` for writes. `HttpQuoteApi` implements both over HTTP with
//! `reqwest`; a transport error and a non-2xx status are both plain failures.
use async_trait::async_trait;
use log::debug;
use quote_common::QuoteError;
use quote_common::net::{
    CLIENTS_PATH, PRODUCTS_PATH, QUOTES_PATH, SEARCH_PARAM, UNITS_PATH, endpoint, quote_url,
};
use quote_common::record::{Client, Product, Quote, Unit};
use quote_common::stats::StatsRow;
use reqwest::Response;
use serde::de::DeserializeOwned;

/// Remote read used by the debounced query controller.
#[async_trait]
pub trait SearchSource<T>: Send + Sync {
    /// Lists records matching `text`; an empty `text` lists everything.
    async fn search(&self, text: &str) -> Result<Vec<T>, QuoteError>;
}

/// Remote write used by the mutation controller.
#[async_trait]
pub trait RecordWriter<R>: Send + Sync {
    /// Sends a partial update of `record` (PATCH).
    async fn update(&self, record: &R) -> Result<(), QuoteError>;

    /// Creates `record` (POST) and returns the stored version.
    async fn create(&self, record: &R) -> Result<R, QuoteError>;
}

/// HTTP client for the quote API.
#[derive(Debug, Clone)]
pub struct HttpQuoteApi {
    client: reqwest::Client,
    base_url: String,
}

fn transport(err: reqwest::Error) -> QuoteError {
    QuoteError::Transport(err.to_string())
}

fn check_status(response: Response) -> Result<Response, QuoteError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(QuoteError::Status(status.as_u16()))
    }
}

impl HttpQuoteApi {
    /// Client for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Base URL the client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, text: &str) -> Result<Vec<T>, QuoteError> {
        let url = endpoint(&self.base_url, path);
        debug!("GET {} search={:?}", url, text);
        let mut request = self.client.get(&url);
        if !text.is_empty() {
            request = request.query(&[(SEARCH_PARAM, text)]);
        }
        let response = check_status(request.send().await.map_err(transport)?)?;
        response.json::<Vec<T>>().await.map_err(transport)
    }

    /// Monthly dashboard rows from the API root.
    pub async fn fetch_stats(&self) -> Result<Vec<StatsRow>, QuoteError> {
        let url = endpoint(&self.base_url, "/");
        debug!("GET {}", url);
        let response = check_status(self.client.get(&url).send().await.map_err(transport)?)?;
        response.json::<Vec<StatsRow>>().await.map_err(transport)
    }
}

#[async_trait]
impl SearchSource<Quote> for HttpQuoteApi {
    async fn search(&self, text: &str) -> Result<Vec<Quote>, QuoteError> {
        self.list(QUOTES_PATH, text).await
    }
}

#[async_trait]
impl SearchSource<Client> for HttpQuoteApi {
    async fn search(&self, text: &str) -> Result<Vec<Client>, QuoteError> {
        self.list(CLIENTS_PATH, text).await
    }
}

#[async_trait]
impl SearchSource<Product> for HttpQuoteApi {
    async fn search(&self, text: &str) -> Result<Vec<Product>, QuoteError> {
        self.list(PRODUCTS_PATH, text).await
    }
}

#[async_trait]
impl SearchSource<Unit> for HttpQuoteApi {
    async fn search(&self, text: &str) -> Result<Vec<Unit>, QuoteError> {
        self.list(UNITS_PATH, text).await
    }
}

#[async_trait]
impl RecordWriter<Quote> for HttpQuoteApi {
    async fn update(&self, record: &Quote) -> Result<(), QuoteError> {
        let url = quote_url(&self.base_url, record.id);
        debug!("PATCH {}", url);
        let response = self
            .client
            .patch(&url)
            .json(record)
            .send()
            .await
            .map_err(transport)?;
        check_status(response)?;
        Ok(())
    }

    async fn create(&self, record: &Quote) -> Result<Quote, QuoteError> {
        let url = endpoint(&self.base_url, QUOTES_PATH);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(transport)?;
        check_status(response)?
            .json::<Quote>()
            .await
            .map_err(transport)
    }
}
