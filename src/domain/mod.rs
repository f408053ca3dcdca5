//! Protocol-independent data: order parameters, gateway responses,
//! transaction types and the transport ports.

pub mod fields;
pub mod order;
pub mod ports;
pub mod response;
pub mod transaction;
