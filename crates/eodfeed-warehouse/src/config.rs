use std::path::PathBuf;

/// S&P 500 tracker, always priced alongside the holdings.
pub const BENCHMARK: &str = "SPY";

/// Trailing calendar days requested per run; covers weekends & holidays.
pub const WINDOW_DAYS: u32 = 5;

/// Resolved settings for a single daily run.
#[derive(Debug, Clone)]
pub struct Config {
    pub portfolios: PathBuf,
    pub prices: PathBuf,
    pub benchmark: String,
    pub window_days: u32,
    /// Split & dividend adjusted closes.
    pub adjusted: bool,
    /// Fetch & merge, but leave `prices` untouched.
    pub dry_run: bool,
}

impl Config {
    pub fn new(portfolios: impl Into<PathBuf>, prices: impl Into<PathBuf>) -> Self {
        Self {
            portfolios: portfolios.into(),
            prices: prices.into(),
            benchmark: BENCHMARK.to_string(),
            window_days: WINDOW_DAYS,
            adjusted: true,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
