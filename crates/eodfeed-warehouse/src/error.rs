use thiserror::Error;

/// Problems found while validating `portfolios.json`, after it decoded cleanly.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("section {section} holding {holding} has a blank ticker")]
    BlankTicker { section: usize, holding: usize },
}
