pub mod api;
pub mod comparison;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod gameweek;
pub mod http_client;
pub mod logging;
pub mod lookup;
pub mod season;
pub mod session;
pub mod state;

pub use error::{FplError, FplResult};
