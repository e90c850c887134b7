//! # Event Bus Module
//!
//! Provides an event bus for decoupled communication between the job
//! subsystem and whatever renders its state.
//!
//! ## Overview
//!
//! - Jobs publish typed events without knowing subscribers
//! - Subscribers filter and receive events of interest
//! - Supports both sync handlers and async (broadcast) receivers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolpathkit_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = Arc::new(EventBus::new());
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Job]),
//!     |event| tracing::info!("{}", event.description()),
//! );
//!
//! // hand `bus.clone()` to the job services, then later:
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
