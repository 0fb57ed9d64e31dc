//! Inbound request handling
//!
//! This module contains:
//! - `envelope` - Resolves the transport shape of a raw request
//! - `action` - The requested action and its validator

pub mod action;
pub mod envelope;

pub use action::{validate_action, Action, ValidationError};
pub use envelope::{InboundRequest, RequestShapeError};
