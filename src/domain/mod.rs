//! Domain types and the ports the application layer talks through.

pub mod account;
pub mod event;
pub mod notification;
pub mod order;
pub mod ports;
