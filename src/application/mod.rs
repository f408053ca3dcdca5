//! The gateway flows.
//!
//! Each flow is a set of pure functions over a [`SigningEngine`]; the
//! [`Redsys`] client binds them to one merchant configuration and owns the
//! lazily-created web-service transport.
//!
//! [`SigningEngine`]: crate::infrastructure::signing::SigningEngine
//! [`Redsys`]: client::Redsys

pub mod canonical;
pub mod client;
pub mod formatter;
pub mod notification;
pub mod petition;
pub mod redirect;
pub mod soap_notification;
