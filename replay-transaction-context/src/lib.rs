#![deny(clippy::arithmetic_side_effects)]

//! Transaction-scoped account table (spec.md §4.F), per-instruction borrow
//! discipline (§4.G) and the instruction/transaction context stack (§4.H).
//!
//! Re-architected per spec.md §9's "Design Notes": the teacher's
//! `TransactionContext`/`InstructionContext`/`BorrowedAccount` cycle of
//! back-pointers is replaced with an arena-plus-index model. `BorrowedAccount`
//! never holds a raw back-pointer into another handle — only an index into
//! `TransactionContext`'s account vector plus a short-lived lease, and the
//! lease is validated (and released) against a per-account counter instead
//! of relying on `RefCell`'s panic-on-conflict behavior, so borrow conflicts
//! surface as an `InstructionError::AccountBorrowFailed` Result instead of a
//! panic.

mod account_slot;
mod borrowed_account;
mod instruction_context;
mod transaction_context;

pub use {
    account_slot::MAX_PERMITTED_DATA_LENGTH,
    borrowed_account::BorrowedAccount,
    instruction_context::{InstructionAccount, InstructionContext},
    transaction_context::{IndexOfAccount, TransactionContext, MAX_INSTRUCTION_STACK_DEPTH},
};

#[cfg(test)]
mod tests;
