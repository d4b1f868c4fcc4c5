//! Alert aggregation, rendering and delivery

mod aggregator;
mod dispatcher;
mod transports;

pub use aggregator::AlertAggregator;
pub use dispatcher::{AlertBatch, AlertDispatcher, DispatchOutcome};
pub use transports::{EmailTransport, SlackTransport, Transport};
