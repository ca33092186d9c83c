use clap::{Parser, Subcommand, ValueEnum};
use eodfeed_warehouse::endp::yahoo_finance;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Sets the level of tracing
    #[arg(long, default_value = "INFO", ignore_case = true, global = true)]
    pub trace: TraceLevel,

    /// Portfolio definition listing the holdings to price
    #[arg(
        long,
        env = "PORTFOLIOS_PATH",
        default_value = "public/data/portfolios.json",
        global = true
    )]
    pub portfolios: PathBuf,

    /// Price history, created on the first run and rewritten in full after
    #[arg(
        long,
        env = "PRICES_PATH",
        default_value = "public/data/prices.json",
        global = true
    )]
    pub prices: PathBuf,

    /// Sent with every Yahoo Finance request
    #[arg(
        long,
        env = "USER_AGENT",
        default_value = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
        global = true
    )]
    pub user_agent: String,

    #[arg(
        long,
        env = "YAHOO_FINANCE_URL",
        default_value = yahoo_finance::BASE_URL,
        global = true
    )]
    pub base_url: String,

    /// Fetch & merge, but don't write the price history
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Append the latest daily closes to the price history (default).
    Run,

    /// List the tickers the portfolio resolves to, benchmark included.
    Tickers,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    DEBUG,
    INFO,
    WARN,
    ERROR,
}
