//! State Module - Cross-component shared state.
//!
//! - **Context** - Providers registered per tree, consumer subscriptions,
//!   teardown when either side is cleared

mod context;

pub use context::{ContextGraph, ContextHandle, Provider};
