//! Domain types and the ports the reconciler depends on.

pub mod acquirer;
pub mod amount;
pub mod notification;
pub mod ports;
pub mod transaction;
