//! Grid market data - electricity market data for DE, GB and IE
//!
//! Retrieves public market data from three transparency APIs and returns it
//! as local-time indexed tables:
//!
//! - **SMARD** (Germany, Europe/Berlin): day-ahead prices per bidding zone,
//!   per-type generation (gross or net), demand, per-unit generation
//! - **BMRS** (Great Britain, Europe/London): per-type generation, demand
//! - **EirGrid** (island of Ireland, Europe/Dublin): per-type generation
//!   estimate, demand, GB↔IE interconnector flows
//!
//! # Features
//! - Provider-native fetch units (ISO weeks for SMARD, days for BMRS/EirGrid)
//! - DST-aware day indices (92/96/100 quarter-hours, 46/48/50 half-hours)
//! - Missing data stays missing: unavailable units become holes, never zeros
//! - Cached SMARD power plant registry with staleness-based refresh
//!
//! # Example
//!
//! ```no_run
//! use chrono::TimeZone;
//! use chrono_tz::Europe::Berlin;
//! use grid_market_data::{BiddingZone, Config, SmardClient};
//!
//! let config = Config::from_env()?;
//! let smard = SmardClient::new(&config)?;
//!
//! let start = Berlin.with_ymd_and_hms(2023, 9, 18, 0, 0, 0).unwrap();
//! let end = Berlin.with_ymd_and_hms(2023, 9, 24, 23, 45, 0).unwrap();
//! let prices = smard.day_ahead_prices(BiddingZone::DeLu, &start, &end)?;
//! prices.write_csv(std::io::stdout())?;
//! # Ok::<(), grid_market_data::MarketDataError>(())
//! ```

pub mod alignment;
pub mod assembly;
pub mod bmrs;
pub mod catalog;
pub mod config;
pub mod eirgrid;
mod error;
pub mod http;
pub mod normalize;
pub mod power_plants;
mod resource;
pub mod smard;
pub mod table;
pub mod windowing;

// Re-export public types for easier access
pub use bmrs::BmrsClient;
pub use catalog::{BiddingZone, SeriesKind, SeriesLabel};
pub use config::Config;
pub use eirgrid::EirGridClient;
pub use error::{ApiError, MarketDataError, ParseError, Result};
pub use http::{FailurePolicy, HttpFetcher};
pub use power_plants::{PowerPlantRecord, PowerPlantRegistry, UnitLabel, YearBound};
pub use resource::ResourceType;
pub use smard::SmardClient;
pub use table::{Column, TimeSeriesTable};
pub use windowing::{FetchUnit, Granularity};
