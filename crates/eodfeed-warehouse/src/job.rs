use crate::api::Provider;
use crate::config::Config;
use crate::schema::portfolio::{Portfolio, TickerSet};
use crate::schema::prices::{MergeReport, PriceHistory};
use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

/// How a daily run ended. Every variant is a clean exit.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The portfolio lists no holdings; nothing to price.
    NoHoldings,
    /// History already has an entry for this date; the provider was not called.
    AlreadyFresh(NaiveDate),
    /// The provider call failed; history was left untouched.
    FetchFailed(String),
    /// The provider returned no trading days; history was left untouched.
    NoData,
    /// The merge completed. `written` is false on a dry run.
    Updated { report: MergeReport, written: bool },
}

/// Load `portfolios.json` and resolve the tickers to price.
pub async fn resolve_tickers(config: &Config) -> anyhow::Result<TickerSet> {
    let portfolio = Portfolio::load(&config.portfolios).await?;
    let tickers = TickerSet::resolve(&portfolio, &config.benchmark)
        .with_context(|| format!("invalid portfolio document {}", config.portfolios.display()))?;
    Ok(tickers)
}

/// Fetch the latest closes and append them to the price history.
pub struct DailyRun<'a, P> {
    config: &'a Config,
    provider: &'a P,
}

impl<'a, P: Provider + Sync> DailyRun<'a, P> {
    pub fn new(config: &'a Config, provider: &'a P) -> Self {
        Self { config, provider }
    }

    pub async fn run(&self) -> anyhow::Result<Outcome> {
        self.run_at(Local::now().date_naive(), Utc::now()).await
    }

    /// Run as if the local date were `today` and the clock read `now`.
    ///
    /// `Err` is reserved for the local files: an unreadable portfolio or
    /// history, or a failed write. Provider trouble ends in an [`Outcome`].
    pub async fn run_at(&self, today: NaiveDate, now: DateTime<Utc>) -> anyhow::Result<Outcome> {
        let config = self.config;

        let tickers = resolve_tickers(config).await?;
        if tickers.is_empty() {
            info!("No tickers found in {}", config.portfolios.display());
            return Ok(Outcome::NoHoldings);
        }
        info!("Fetching prices for {} tickers: {tickers}", tickers.len());

        let mut history = PriceHistory::load(&config.prices).await?;
        if history.has_date(&today) {
            info!("Already have prices for {today}, skipping.");
            return Ok(Outcome::AlreadyFresh(today));
        }

        let table = match self
            .provider
            .fetch_recent_closes(&tickers, config.window_days, config.adjusted)
            .await
        {
            Ok(table) => table,
            Err(e) => {
                error!("Error fetching data: {e:#}");
                return Ok(Outcome::FetchFailed(format!("{e:#}")));
            }
        };

        if table.is_empty() {
            warn!("No data returned from provider");
            return Ok(Outcome::NoData);
        }
        debug!("provider returned {} trading days", table.dates().count());

        let report = history.merge(&table, &tickers);
        for (date, count) in &report.added {
            info!("Added prices for {date}: {count} tickers");
        }
        if !report.missing.is_empty() {
            let missing: Vec<&str> = report.missing.iter().map(String::as_str).collect();
            warn!("No closes recorded for: {}", missing.join(", "));
        }

        history.touch(now);

        if config.dry_run {
            info!("Dry run; {} left untouched", config.prices.display());
            return Ok(Outcome::Updated {
                report,
                written: false,
            });
        }

        history.save(&config.prices).await?;
        info!("Prices saved to {}", config.prices.display());

        Ok(Outcome::Updated {
            report,
            written: true,
        })
    }
}
