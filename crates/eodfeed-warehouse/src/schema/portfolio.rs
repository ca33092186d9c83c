use crate::error::ValidationError;
use anyhow::Context;
use eodfeed_util::read_json;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, trace};

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// `portfolios.json`, as maintained for the dashboard
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub start_date: Option<String>,
    pub initial_investment: Option<f64>,
    pub sections: Vec<Section>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Section {
    pub id: Option<String>,
    pub instructor: Option<String>,
    pub name: Option<String>,
    pub holdings: Vec<Holding>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Holding {
    pub ticker: String,
    pub company: Option<String>,
    pub votes: Option<f64>,
}

impl Portfolio {
    /// Read & decode the portfolio definition at `path`.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        trace!("loading portfolio from {}", path.display());
        let portfolio: Self = read_json(path)
            .await
            .with_context(|| format!("invalid portfolio document {}", path.display()))?;
        debug!(
            "portfolio loaded: {} sections, {} holdings",
            portfolio.sections.len(),
            portfolio.holding_count()
        );
        Ok(portfolio)
    }

    pub fn holding_count(&self) -> usize {
        self.sections.iter().map(|s| s.holdings.len()).sum()
    }

    /// Iterate every holding across all sections, tagged with its
    /// (section, holding) position.
    fn holdings(&self) -> impl Iterator<Item = (usize, usize, &Holding)> {
        self.sections.iter().enumerate().flat_map(|(i, section)| {
            section
                .holdings
                .iter()
                .enumerate()
                .map(move |(j, holding)| (i, j, holding))
        })
    }
}

// -------------------------------------------------------------------------------------------------

/// Deduplicated, upper-cased symbols to price; iterates in sorted order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickerSet(BTreeSet<String>);

impl TickerSet {
    /// Every ticker referenced by `portfolio`, plus `benchmark`.
    ///
    /// A portfolio without holdings resolves to an empty set; the benchmark
    /// is only priced alongside real holdings.
    pub fn resolve(portfolio: &Portfolio, benchmark: &str) -> Result<Self, ValidationError> {
        let mut tickers = BTreeSet::new();
        for (section, holding, entry) in portfolio.holdings() {
            let ticker = entry.ticker.trim();
            if ticker.is_empty() {
                return Err(ValidationError::BlankTicker { section, holding });
            }
            tickers.insert(ticker.to_uppercase());
        }

        if !tickers.is_empty() {
            tickers.insert(benchmark.trim().to_uppercase());
        }

        Ok(Self(tickers))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TickerSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for TickerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", joined.join(", "))
    }
}
