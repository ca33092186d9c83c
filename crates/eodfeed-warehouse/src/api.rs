use crate::schema::portfolio::TickerSet;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub type HttpClient = reqwest::Client;

/// A market-data source of daily closing prices.
#[async_trait]
pub trait Provider {
    /// Closes for every ticker in `tickers` over the trailing `window_days`
    /// calendar days.
    ///
    /// A ticker the source knows nothing about should simply be absent
    /// from the table; `Err` is reserved for the fetch as a whole failing.
    async fn fetch_recent_closes(
        &self,
        tickers: &TickerSet,
        window_days: u32,
        adjusted: bool,
    ) -> anyhow::Result<CloseTable>;
}

/// Closing prices keyed by trading date, then ticker.
///
/// `None` marks a row the provider returned without a usable value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CloseTable(BTreeMap<NaiveDate, BTreeMap<String, Option<f64>>>);

impl CloseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, ticker: impl Into<String>, close: Option<f64>) {
        self.0.entry(date).or_default().insert(ticker.into(), close);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Trading dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.0.keys()
    }

    /// The raw close of `ticker` on `date`, if the provider sent one.
    pub fn close(&self, date: &NaiveDate, ticker: &str) -> Option<f64> {
        self.0.get(date)?.get(ticker).copied().flatten()
    }
}
