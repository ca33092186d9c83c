use crate::api::CloseTable;
use crate::schema::portfolio::TickerSet;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use eodfeed_util::{read_json_opt, write_json_sorted};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, trace};

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// `prices.json`: the persisted daily close history read by the dashboard
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

/// Closes for one trading day, keyed by ticker.
pub type DayPrices = BTreeMap<String, f64>;

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistory {
    pub last_updated: Option<String>,
    #[serde(default)]
    pub prices: BTreeMap<NaiveDate, DayPrices>,

    // anything else found in the file survives the rewrite
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// What a [`PriceHistory::merge()`] added.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MergeReport {
    /// Each net-new date, with the number of tickers recorded for it.
    pub added: Vec<(NaiveDate, usize)>,
    /// Requested tickers that produced no value on any of the new dates.
    pub missing: BTreeSet<String>,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

impl PriceHistory {
    /// Read the history at `path`, or start an empty one on first run.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        match read_json_opt::<Self>(path).await? {
            Some(history) => {
                debug!(
                    "price history loaded: {} dates, last updated {:?}",
                    history.prices.len(),
                    history.last_updated
                );
                Ok(history)
            }
            None => {
                info!("No price history at {}; starting a new one", path.display());
                Ok(Self::default())
            }
        }
    }

    /// Overwrite `path` with the full document.
    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        write_json_sorted(path, self).await
    }

    /// Whether any entry exists for `date`, complete or not.
    pub fn has_date(&self, date: &NaiveDate) -> bool {
        self.prices.contains_key(date)
    }

    /// Fold `table` into the history, one net-new date at a time.
    ///
    /// Dates already present are never touched. Values that are missing or
    /// not finite are dropped, the rest are rounded to cents, and a date
    /// left with nothing to record is not added at all.
    pub fn merge(&mut self, table: &CloseTable, tickers: &TickerSet) -> MergeReport {
        let mut report = MergeReport::default();
        let mut seen = BTreeSet::new();

        for date in table.dates() {
            if self.has_date(date) {
                trace!("{date} already recorded; leaving it as is");
                continue;
            }

            let day: DayPrices = tickers
                .iter()
                .filter_map(|ticker| {
                    // checked after rounding: huge closes overflow to inf
                    let close = table
                        .close(date, ticker)
                        .map(round_cents)
                        .filter(|c| c.is_finite())?;
                    Some((ticker.to_string(), close))
                })
                .collect();

            if day.is_empty() {
                debug!("{date} returned no usable closes; skipped");
                continue;
            }

            seen.extend(day.keys().cloned());
            report.added.push((*date, day.len()));
            self.prices.insert(*date, day);
        }

        if !report.is_empty() {
            report.missing = tickers
                .iter()
                .filter(|ticker| !seen.contains(*ticker))
                .map(str::to_string)
                .collect();
        }

        report
    }

    /// Stamp `lastUpdated` as an ISO-8601 UTC instant, e.g. `2025-01-06T22:05:13.104519Z`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(now.to_rfc3339_opts(SecondsFormat::Micros, true));
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn tickers(symbols: &[&str]) -> TickerSet {
        symbols.iter().copied().collect()
    }

    #[test]
    fn closes_are_rounded_to_cents() {
        let mut table = CloseTable::new();
        table.insert(date("2025-01-06"), "AAPL", Some(123.4567));

        let mut history = PriceHistory::default();
        history.merge(&table, &tickers(&["AAPL"]));

        assert_eq!(history.prices[&date("2025-01-06")]["AAPL"], 123.46);
    }

    #[test]
    fn closes_too_large_to_round_are_skipped() {
        let d = date("2025-01-06");
        let mut table = CloseTable::new();
        table.insert(d, "AAPL", Some(1.0e307));
        table.insert(d, "SPY", Some(595.36));

        let mut history = PriceHistory::default();
        history.merge(&table, &tickers(&["AAPL", "SPY"]));

        let day = &history.prices[&d];
        assert!(!day.contains_key("AAPL"));
        assert!(day.values().all(|c| c.is_finite()));

        let text = serde_json::to_string(&history).unwrap();
        let reloaded: PriceHistory = serde_json::from_str(&text).unwrap();
        assert_eq!(reloaded.prices[&d]["SPY"], 595.36);
    }

    #[test]
    fn unusable_values_are_skipped_per_ticker() {
        let d = date("2025-01-06");
        let mut table = CloseTable::new();
        table.insert(d, "AAPL", Some(243.36));
        table.insert(d, "MSFT", Some(f64::NAN));
        table.insert(d, "NVDA", None);

        let mut history = PriceHistory::default();
        let report = history.merge(&table, &tickers(&["AAPL", "MSFT", "NVDA", "SPY"]));

        let day = &history.prices[&d];
        assert_eq!(day.len(), 1);
        assert_eq!(day["AAPL"], 243.36);
        assert_eq!(report.added, vec![(d, 1)]);
        assert_eq!(
            report.missing.into_iter().collect::<Vec<_>>(),
            vec!["MSFT", "NVDA", "SPY"]
        );
    }

    #[test]
    fn existing_dates_are_never_overwritten() {
        let d = date("2025-01-03");
        let mut history = PriceHistory::default();
        history
            .prices
            .insert(d, DayPrices::from([("AAPL".to_string(), 100.0)]));

        let mut table = CloseTable::new();
        table.insert(d, "AAPL", Some(101.25));
        table.insert(date("2025-01-06"), "AAPL", Some(102.5));

        let report = history.merge(&table, &tickers(&["AAPL"]));

        assert_eq!(history.prices[&d]["AAPL"], 100.0);
        assert_eq!(history.prices[&date("2025-01-06")]["AAPL"], 102.5);
        assert_eq!(report.added, vec![(date("2025-01-06"), 1)]);
    }

    #[test]
    fn dates_without_any_value_are_not_added() {
        let mut table = CloseTable::new();
        table.insert(date("2025-01-06"), "AAPL", None);

        let mut history = PriceHistory::default();
        let report = history.merge(&table, &tickers(&["AAPL"]));

        assert!(report.is_empty());
        assert!(report.missing.is_empty());
        assert!(history.prices.is_empty());
    }

    #[test]
    fn unrequested_tickers_are_ignored() {
        let d = date("2025-01-06");
        let mut table = CloseTable::new();
        table.insert(d, "AAPL", Some(1.0));
        table.insert(d, "TSLA", Some(2.0));

        let mut history = PriceHistory::default();
        history.merge(&table, &tickers(&["AAPL"]));

        assert!(!history.prices[&d].contains_key("TSLA"));
    }

    #[test]
    fn touch_writes_utc_designator() {
        let mut history = PriceHistory::default();
        let now = Utc.with_ymd_and_hms(2025, 1, 6, 22, 5, 13).unwrap();
        history.touch(now);
        assert_eq!(
            history.last_updated.as_deref(),
            Some("2025-01-06T22:05:13.000000Z")
        );
    }

    #[test]
    fn document_round_trips_with_unknown_keys() {
        let json = r#"{
            "lastUpdated": "2025-01-03T21:10:00.000000Z",
            "notes": { "source": "yahoo" },
            "prices": { "2025-01-03": { "SPY": 591.95, "AAPL": 243.36 } }
        }"#;
        let history: PriceHistory = serde_json::from_str(json).unwrap();
        assert!(history.has_date(&date("2025-01-03")));
        assert!(history.extra.contains_key("notes"));

        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(value["notes"]["source"], "yahoo");
        assert_eq!(value["prices"]["2025-01-03"]["SPY"], 591.95);
    }

    #[test]
    fn first_run_document_has_null_timestamp() {
        let value = serde_json::to_value(PriceHistory::default()).unwrap();
        assert_eq!(value, serde_json::json!({ "lastUpdated": null, "prices": {} }));
    }
}
