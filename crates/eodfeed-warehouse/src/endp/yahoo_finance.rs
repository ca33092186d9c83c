use crate::api::{CloseTable, HttpClient, Provider};
use crate::schema::portfolio::TickerSet;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, error, trace, warn};

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Daily closes from Yahoo Finance, one chart request per ticker
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

pub const BASE_URL: &str = "https://query1.finance.yahoo.com";

pub struct YahooFinance {
    client: HttpClient,
    base_url: String,
}

impl YahooFinance {
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, ticker: &str) -> String {
        format!("{}/v8/finance/chart/{ticker}", self.base_url)
    }

    /// Closes for a single ticker, or `None` if Yahoo has nothing for it.
    async fn fetch(
        &self,
        ticker: &str,
        window_days: u32,
        adjusted: bool,
    ) -> anyhow::Result<Option<Vec<(NaiveDate, Option<f64>)>>> {
        let url = self.url(ticker);
        let range = format!("{window_days}d");

        trace!("Fetching price data for [{ticker}] from Yahoo Finance");
        let response = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", range.as_str()), ("events", "div|split")])
            .send()
            .await
            .map_err(|e| {
                error!("[{ticker}] price fetching error: {e}\nURL: {url}");
                e
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("[{ticker}] failed to read response body"))?;

        if !status.is_success() {
            // Yahoo still describes unknown symbols in a chart envelope
            let reason = serde_json::from_slice::<ChartHistory>(&body)
                .ok()
                .and_then(|de| de.chart.error)
                .map(|e| format!("{}: {}", e.code, e.description))
                .unwrap_or_else(|| status.to_string());
            warn!("[{ticker}] no price data from Yahoo Finance ({reason})");
            return Ok(None);
        }

        // error check the deserialization
        trace!("Deserializing price data for [{ticker}] from Yahoo Finance");
        let de = serde_json::from_slice::<ChartHistory>(&body).map_err(|e| {
            error!("[{ticker}] deserialization error: {e}\nURL: {url}");
            e
        })?;

        if let Some(e) = de.chart.error {
            warn!("[{ticker}] Yahoo Finance error {}: {}", e.code, e.description);
            return Ok(None);
        }

        let Some(base) = de.chart.result.and_then(|r| r.into_iter().next()) else {
            warn!("[{ticker}] contained no \"chart.result\" object\nURL: {url}");
            return Ok(None);
        };

        Ok(Some(base.closes(adjusted)))
    }
}

#[async_trait]
impl Provider for YahooFinance {
    async fn fetch_recent_closes(
        &self,
        tickers: &TickerSet,
        window_days: u32,
        adjusted: bool,
    ) -> anyhow::Result<CloseTable> {
        let time = std::time::Instant::now();
        let mut table = CloseTable::new();

        for ticker in tickers.iter() {
            let Some(series) = self.fetch(ticker, window_days, adjusted).await? else {
                continue;
            };
            trace!("[{ticker}] {} rows", series.len());
            for (date, close) in series {
                table.insert(date, ticker, close);
            }
        }

        debug!(
            "Fetched {} tickers from Yahoo Finance. Elapsed time: {} ms",
            tickers.len(),
            time.elapsed().as_millis()
        );

        Ok(table)
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, Debug)]
pub struct ChartHistory {
    pub chart: ChartResponse,
}

#[derive(Deserialize, Debug)]
pub struct ChartResponse {
    pub result: Option<Vec<PriceCategories>>,
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct PriceCategories {
    #[serde(default)]
    pub meta: Meta,
    // absent when the range holds no trading days
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug, Default)]
pub struct Meta {
    /// Exchange offset from UTC, in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Deserialize, Debug, Default)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

#[derive(Deserialize, Debug)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Deserialize, Debug)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

impl PriceCategories {
    /// Pair each bar's exchange-local trading date with its close.
    fn closes(self, adjusted: bool) -> Vec<(NaiveDate, Option<f64>)> {
        let series = if adjusted {
            self.indicators.adjclose.into_iter().next().map(|a| a.adjclose)
        } else {
            self.indicators.quote.into_iter().next().map(|q| q.close)
        };
        let closes = series.unwrap_or_default();

        let offset = self.meta.gmtoffset;
        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, timestamp)| {
                let date = DateTime::from_timestamp(timestamp + offset, 0)?.date_naive();
                Some((date, closes.get(i).copied().flatten()))
            })
            .collect()
    }
}
