pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{FeedError, HttpPriceFeed, MockPriceFeed, PriceFeed};
pub use db::{init_db, Repository};
pub use domain::{
    Chain, ChainId, DealCycle, LocationId, Price, PriceObservation, Product, ProductId,
    RetailLocation, StartDay, TimeMs,
};
pub use engine::{CycleLookup, DealEvaluator, PriceFlags, TiePolicy};
pub use error::AppError;
