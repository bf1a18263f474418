//! In-process fan-out of live raffle events.
//!
//! # Event Flow
//!
//! 1. A client connects and the coordinator registers a [`Subscription`]
//!    whose first queued item is a `state` snapshot.
//! 2. Every draw broadcasts `spin-start`, then `spin-complete` + `state`
//!    or `error`, to all current subscriptions.
//! 3. Dropping the subscription (client disconnect) unregisters it.
//!
//! Delivery is lossy on purpose: a full subscriber queue drops the event for
//! that subscriber only. Every `state` event is a full snapshot, so a
//! lagging client catches up on the next one.

pub mod bus;

pub use bus::{EventBus, SUBSCRIBER_QUEUE_CAPACITY, SubscriberId, Subscription};
pub use raffle_sdk::objects::RaffleEvent;
