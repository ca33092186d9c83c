pub mod api;
pub mod config;
pub mod endp;
pub mod error;
pub mod job;
pub mod schema;

pub use crate::api::{CloseTable, Provider};
pub use crate::config::Config;
pub use crate::endp::yahoo_finance::YahooFinance;
pub use crate::error::ValidationError;
pub use crate::job::{DailyRun, Outcome};
pub use crate::schema::{portfolio::TickerSet, prices::PriceHistory};
