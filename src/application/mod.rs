//! Application layer: the ingestion pipeline and event dispatch.
//!
//! `NotificationPipeline` is the entry point for inbound notifications. It
//! records every payload, verifies it through the provider SDK port, and
//! publishes the outcome on an `EventBus` whose reactors run sequentially in
//! registration order.

pub mod event_bus;
pub mod pipeline;
pub mod union_id;
