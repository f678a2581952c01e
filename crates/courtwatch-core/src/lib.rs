//! Core types and state machines for the courtwatch availability monitor.
//!
//! This crate is deliberately free of HTTP and terminal dependencies. It owns
//! the record model, the cascading filter funnel, the TTL cache in front of a
//! [`DataSource`](source::DataSource), and the monitor / notification gate
//! pair that turns "a match exists" into at-most-once alerts.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod cache;
pub mod clock;
pub mod error;
pub mod funnel;
pub mod gate;
pub mod monitor;
pub mod notify;
pub mod record;
pub mod session;
pub mod source;

pub use error::{Error, Result};
