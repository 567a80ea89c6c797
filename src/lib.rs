#![forbid(unsafe_code)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod fetch_cards;
pub mod logging;
pub mod normalize;
pub mod pace;
pub mod records;
pub mod resolve;
pub mod scan;
pub mod search;
pub mod steam;
pub mod store;
