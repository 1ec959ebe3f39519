//! System program (spec.md §4.I, "native handlers for loader/config/system").
//! No literal grounding file exists in the retrieval pack for this one (see
//! `DESIGN.md`); the four operations implemented are the minimal set this
//! workspace's account-creation/lamport-transfer paths actually need —
//! `CreateAccount`, `Assign`, `Transfer`, `Allocate` — built from general
//! knowledge of the real program's account preconditions.

use {
    replay_program_runtime::InvokeContext,
    replay_sdk::{instruction_error::InstructionError, Pubkey},
    serde::{Deserialize, Serialize},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemInstruction {
    CreateAccount { lamports: u64, space: u64, owner: Pubkey },
    Assign { owner: Pubkey },
    Transfer { lamports: u64 },
    Allocate { space: u64 },
}

impl SystemInstruction {
    pub fn deserialize(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

pub fn process_instruction(ctx: &InvokeContext<'_>) -> Result<(), InstructionError> {
    ctx.transaction_context
        .consume_compute_units(ctx.compute_budget.system_program_default_units)?;

    let instruction_context = ctx.transaction_context.get_current_instruction_context()?;
    let data = instruction_context.get_instruction_data().to_vec();
    let instruction =
        SystemInstruction::deserialize(&data).map_err(|_| InstructionError::InvalidInstructionData)?;
    let program_count = instruction_context.get_number_of_program_accounts();
    let at = |caller_index: u16| program_count.saturating_add(caller_index);

    match instruction {
        SystemInstruction::CreateAccount { lamports, space, owner } => {
            let mut funding = ctx
                .transaction_context
                .try_borrow_account(&instruction_context, at(0), true)?;
            let mut new_account = ctx
                .transaction_context
                .try_borrow_account(&instruction_context, at(1), true)?;

            if !funding.is_signer() || !new_account.is_signer() {
                return Err(InstructionError::MissingRequiredSignature);
            }
            if new_account.lamports() != 0 || !new_account.data().is_empty() {
                return Err(InstructionError::AccountAlreadyInitialized);
            }
            if funding.lamports() < lamports {
                return Err(InstructionError::InsufficientFunds);
            }

            funding.set_lamports(funding.lamports().saturating_sub(lamports))?;
            new_account.set_lamports(lamports)?;
            new_account.set_data_from_slice(&vec![0u8; space as usize])?;
            new_account.set_owner(owner)
        }
        SystemInstruction::Assign { owner } => {
            let mut account = ctx
                .transaction_context
                .try_borrow_account(&instruction_context, at(0), true)?;
            if !account.is_signer() {
                return Err(InstructionError::MissingRequiredSignature);
            }
            account.set_owner(owner)
        }
        SystemInstruction::Transfer { lamports } => {
            let mut from = ctx
                .transaction_context
                .try_borrow_account(&instruction_context, at(0), true)?;
            let mut to = ctx
                .transaction_context
                .try_borrow_account(&instruction_context, at(1), true)?;
            if !from.is_signer() {
                return Err(InstructionError::MissingRequiredSignature);
            }
            if from.lamports() < lamports {
                return Err(InstructionError::InsufficientFunds);
            }
            from.set_lamports(from.lamports().saturating_sub(lamports))?;
            to.set_lamports(to.lamports().saturating_add(lamports))
        }
        SystemInstruction::Allocate { space } => {
            let mut account = ctx
                .transaction_context
                .try_borrow_account(&instruction_context, at(0), true)?;
            if !account.is_signer() {
                return Err(InstructionError::MissingRequiredSignature);
            }
            if !account.data().is_empty() {
                return Err(InstructionError::AccountAlreadyInitialized);
            }
            account.set_data_from_slice(&vec![0u8; space as usize])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_account_round_trips() {
        let ix = SystemInstruction::CreateAccount {
            lamports: 100,
            space: 8,
            owner: Pubkey::new_from_array([1u8; 32]),
        };
        let bytes = bincode::serialize(&ix).unwrap();
        assert_eq!(SystemInstruction::deserialize(&bytes).unwrap(), ix);
    }
}
