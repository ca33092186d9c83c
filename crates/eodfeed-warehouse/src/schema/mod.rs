pub mod portfolio;
pub mod prices;
