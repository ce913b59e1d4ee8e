//! HTTP middleware stack.
//!
//! Execution order on protected routes (outermost → innermost):
//! 1. Session validator: cookie lookup, identity reload
//! 2. Audit logger: logs after auth, has the identity key
//! 3. Role gate: admin / doctor / patient

pub mod audit;
pub mod auth;
