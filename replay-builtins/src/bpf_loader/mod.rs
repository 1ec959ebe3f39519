//! Upgradeable BPF Loader builtin (spec.md §4.I).

pub mod instruction;
pub mod processor;
pub mod state;

pub use {instruction::UpgradeableLoaderInstruction, state::UpgradeableLoaderState};
