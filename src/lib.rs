//! Comparative-market-analysis engine: property search, comparable-set
//! statistics, price timelines and seller-update matching, plus the SQLite
//! store and JSON server that sit around them.

pub mod analysis;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod jobs;
pub mod notifier;
pub mod params;
pub mod responses;
pub mod router;

#[cfg(test)]
mod tests;
