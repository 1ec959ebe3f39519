//! Typed read/write helpers over the well-known sysvar accounts, and a
//! build-once [`cache::SysvarCache`] (spec.md §4.J).
//!
//! One module per sysvar, mirroring the teacher's `sdk/sysvar` layout: each
//! exposes `id()` (the well-known account address), `from_account` (decode)
//! and `to_account` (re-encode in place).

pub mod cache;
pub mod clock;
pub mod epoch_rewards;
pub mod epoch_schedule;
pub mod error;
mod id;
pub mod last_restart_slot;
pub mod recent_blockhashes;
pub mod rent;
pub mod slot_hashes;
pub mod stake_history;

pub use {cache::SysvarCache, error::SysvarError};
