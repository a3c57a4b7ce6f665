//! Handler trait, context and dispatch.

pub mod context;
pub mod registry;
