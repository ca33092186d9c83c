use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands::*, TraceLevel};
use dotenv::dotenv;
use eodfeed_warehouse::{self as warehouse, Config, DailyRun, Outcome, YahooFinance};
use tracing::{debug, info, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;

fn preprocess(trace_level: Level) {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber).expect("Set subscriber");
}

// one sequential job: no worker threads needed
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // `.env` first, so clap's env fallbacks can see it
    dotenv().ok();
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::DEBUG => Level::DEBUG,
        TraceLevel::INFO => Level::INFO,
        TraceLevel::WARN => Level::WARN,
        TraceLevel::ERROR => Level::ERROR,
    };

    preprocess(log_level);
    trace!("Command line input recorded: {cli:#?}");

    let config = Config::new(&cli.portfolios, &cli.prices).dry_run(cli.dry_run);

    // cli framework:
    // "> eodfeed [COMMAND]"
    match cli.command.unwrap_or(Run) {
        // "> eodfeed run"
        // fetch the trailing window of closes and append net-new days
        Run => {
            let http_client = reqwest::ClientBuilder::new()
                .user_agent(&cli.user_agent)
                .build()?;
            let provider = YahooFinance::with_base_url(http_client, &cli.base_url);

            // soft failures are logged inside the run and still exit 0
            match DailyRun::new(&config, &provider).run().await? {
                Outcome::Updated { report, written } => debug!(
                    "{} new dates, written: {written}",
                    report.added.len()
                ),
                outcome => debug!("Run ended early: {outcome:?}"),
            }
        }

        // "> eodfeed tickers"
        // list the resolved ticker set, sorted
        Tickers => {
            let tickers = warehouse::job::resolve_tickers(&config).await?;
            info!("{} tickers resolved from {}", tickers.len(), config.portfolios.display());
            for ticker in tickers.iter() {
                println!("{ticker}");
            }
        }
    }

    Ok(())
}
