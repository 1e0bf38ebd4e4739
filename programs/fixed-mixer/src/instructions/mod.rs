//! Transaction handlers
//!
//! Each handler takes the pool state by mutable reference and either
//! commits all of its changes or none. Spend handlers split into a
//! `precheck` (before proof verification) and a `handler` (commit).

pub mod admin;
pub mod deposit;
pub mod forward;
pub mod withdraw;

pub use withdraw::Recipient;
