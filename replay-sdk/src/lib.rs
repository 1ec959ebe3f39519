#![deny(clippy::arithmetic_side_effects)]

//! Core data types shared by every crate in the workspace: account keys,
//! hashes, accounts, instructions and the runtime error taxonomy.
//!
//! This crate intentionally has no dependency on the SBPF loader/VM or on
//! the transaction-context borrow machinery — it only defines the wire and
//! in-memory shapes those crates operate on.

pub mod account;
pub mod clock;
pub mod epoch_rewards;
pub mod epoch_schedule;
pub mod hash;
pub mod instruction;
pub mod instruction_error;
pub mod last_restart_slot;
pub mod pubkey;
pub mod recent_blockhashes;
pub mod rent;
pub mod slot_hashes;
pub mod stake_history;

pub use {
    account::{Account, AccountLoader}, hash::Hash, instruction::{AccountMeta, Instruction},
    instruction_error::InstructionError, pubkey::Pubkey,
};
