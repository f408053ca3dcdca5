pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod logging;

pub use application::client::Redsys;
pub use config::{ClientConfig, GatewayUrls, PRODUCTION_URLS, SANDBOX_URLS};
pub use domain::order::{OrderParameters, ParamValue};
pub use domain::response::GatewayResponse;
pub use domain::transaction::{TransactionType, random_transaction_id};
pub use error::{RedsysError, Result};
