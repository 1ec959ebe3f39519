//! Instruction Context (spec.md §4 table, "Instruction Context"): program-id
//! stack height, program-account prefix, instruction-account vector,
//! instruction data, nesting depth.

use replay_sdk::instruction_error::InstructionError;

pub type IndexOfAccount = u16;

/// Reference into the transaction account vector tagged with the caller and
/// callee-relative positions plus signer/writable flags (spec.md §3,
/// "Instruction Account").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstructionAccount {
    pub index_in_transaction: IndexOfAccount,
    pub index_in_caller: IndexOfAccount,
    pub index_in_callee: IndexOfAccount,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// One entry in the transaction context's instruction-context stack. The
/// accounts that identify which program runs this instruction (usually one
/// account, two for the Upgradeable Loader's Program+ProgramData pair) form
/// a prefix addressed uniformly with the instruction's own accounts via
/// `index_in_instruction`, matching spec.md §3's account-addressing rule.
#[derive(Clone, Debug)]
pub struct InstructionContext {
    pub(crate) nesting_level: usize,
    pub(crate) program_accounts: Vec<IndexOfAccount>,
    pub(crate) instruction_accounts: Vec<InstructionAccount>,
    pub(crate) instruction_data: Vec<u8>,
}

impl InstructionContext {
    pub fn new(
        nesting_level: usize,
        program_accounts: Vec<IndexOfAccount>,
        instruction_accounts: Vec<InstructionAccount>,
        instruction_data: Vec<u8>,
    ) -> Self {
        Self {
            nesting_level,
            program_accounts,
            instruction_accounts,
            instruction_data,
        }
    }

    pub fn nesting_level(&self) -> usize {
        self.nesting_level
    }

    pub fn get_instruction_data(&self) -> &[u8] {
        &self.instruction_data
    }

    pub fn get_number_of_program_accounts(&self) -> IndexOfAccount {
        self.program_accounts.len() as IndexOfAccount
    }

    pub fn get_number_of_instruction_accounts(&self) -> IndexOfAccount {
        self.instruction_accounts.len() as IndexOfAccount
    }

    pub fn get_number_of_accounts(&self) -> IndexOfAccount {
        self.get_number_of_program_accounts()
            .saturating_add(self.get_number_of_instruction_accounts())
    }

    /// Resolves `index_in_instruction` into the transaction account table,
    /// subtracting the program-account prefix count with saturating
    /// arithmetic as spec.md §4.G requires.
    pub fn get_index_in_transaction(
        &self,
        index_in_instruction: IndexOfAccount,
    ) -> Result<IndexOfAccount, InstructionError> {
        let program_count = self.get_number_of_program_accounts();
        if index_in_instruction < program_count {
            self.program_accounts
                .get(index_in_instruction as usize)
                .copied()
                .ok_or(InstructionError::NotEnoughAccountKeys)
        } else {
            let instr_idx = index_in_instruction.saturating_sub(program_count);
            self.instruction_accounts
                .get(instr_idx as usize)
                .map(|a| a.index_in_transaction)
                .ok_or(InstructionError::NotEnoughAccountKeys)
        }
    }

    fn instruction_account_at(
        &self,
        instruction_account_index: IndexOfAccount,
    ) -> Result<&InstructionAccount, InstructionError> {
        self.instruction_accounts
            .get(instruction_account_index as usize)
            .ok_or(InstructionError::NotEnoughAccountKeys)
    }

    pub fn is_instruction_account_signer(
        &self,
        instruction_account_index: IndexOfAccount,
    ) -> Result<bool, InstructionError> {
        Ok(self
            .instruction_account_at(instruction_account_index)?
            .is_signer)
    }

    pub fn is_instruction_account_writable(
        &self,
        instruction_account_index: IndexOfAccount,
    ) -> Result<bool, InstructionError> {
        Ok(self
            .instruction_account_at(instruction_account_index)?
            .is_writable)
    }

    /// Index (in the transaction account table) of the last program account
    /// in the prefix — the program actually invoked for this instruction.
    pub fn get_last_program_account_index(&self) -> Result<IndexOfAccount, InstructionError> {
        self.program_accounts
            .last()
            .copied()
            .ok_or(InstructionError::MissingAccount)
    }

    pub fn program_accounts(&self) -> &[IndexOfAccount] {
        &self.program_accounts
    }

    pub fn instruction_accounts(&self) -> &[InstructionAccount] {
        &self.instruction_accounts
    }
}
