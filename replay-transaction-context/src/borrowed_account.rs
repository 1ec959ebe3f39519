//! A leased handle onto one account slot for the duration of an
//! instruction, enforcing spec.md §4.G's precondition table. Grounded on
//! `original_source/pkg/sealevel/borrowed_account.go`'s `BorrowedAccount`
//! (`Touch`, `SetData`, `IsZeroed`, `SetOwner`, `IsSigner`/`IsWritable`,
//! `DataCanBeChanged`, `CanDataBeResized`).

use {
    crate::{
        account_slot::MAX_PERMITTED_DATA_LENGTH,
        instruction_context::InstructionContext,
        transaction_context::{IndexOfAccount, TransactionContext},
    },
    replay_sdk::{instruction_error::InstructionError, Account, Pubkey},
};

pub struct BorrowedAccount<'a> {
    pub(crate) transaction_context: &'a TransactionContext,
    pub(crate) instruction_context: &'a InstructionContext,
    pub(crate) index_in_transaction: IndexOfAccount,
    pub(crate) index_in_instruction: IndexOfAccount,
    pub(crate) write: bool,
}

impl<'a> Drop for BorrowedAccount<'a> {
    fn drop(&mut self) {
        self.transaction_context
            .release_account(self.index_in_transaction, self.write);
    }
}

impl<'a> BorrowedAccount<'a> {
    pub(crate) fn new(
        transaction_context: &'a TransactionContext,
        instruction_context: &'a InstructionContext,
        index_in_transaction: IndexOfAccount,
        index_in_instruction: IndexOfAccount,
        write: bool,
    ) -> Self {
        Self {
            transaction_context,
            instruction_context,
            index_in_transaction,
            index_in_instruction,
            write,
        }
    }

    fn slot(&self) -> &crate::account_slot::AccountSlot {
        self.transaction_context.slot_at(self.index_in_transaction)
    }

    pub fn key(&self) -> &Pubkey {
        self.transaction_context
            .get_key_of_account_at_index(self.index_in_transaction)
    }

    pub fn owner(&self) -> Pubkey {
        self.slot().get().owner
    }

    pub fn lamports(&self) -> u64 {
        self.slot().get().lamports
    }

    pub fn data(&self) -> &[u8] {
        &self.slot().get().data
    }

    pub fn is_executable(&self) -> bool {
        self.slot().get().executable
    }

    pub fn is_zeroed(&self) -> bool {
        self.slot().get().data.iter().all(|&b| b == 0)
    }

    /// `original_source`'s `IsSigner`: saturating-subtraction index into the
    /// instruction's own account vector, past the program-account prefix.
    pub fn is_signer(&self) -> bool {
        let program_count = self.instruction_context.get_number_of_program_accounts();
        if self.index_in_instruction < program_count {
            return false;
        }
        let idx = self.index_in_instruction.saturating_sub(program_count);
        self.instruction_context
            .is_instruction_account_signer(idx)
            .unwrap_or(false)
    }

    pub fn is_writable(&self) -> bool {
        let program_count = self.instruction_context.get_number_of_program_accounts();
        if self.index_in_instruction < program_count {
            return false;
        }
        let idx = self.index_in_instruction.saturating_sub(program_count);
        self.instruction_context
            .is_instruction_account_writable(idx)
            .unwrap_or(false)
    }

    fn require_write(&self) -> Result<(), InstructionError> {
        if !self.write {
            return Err(InstructionError::AccountBorrowFailed);
        }
        Ok(())
    }

    /// `program_accounts` stores transaction-level indices directly (it is
    /// the prefix, not a further level of instruction-local indirection).
    fn program_key(&self) -> Pubkey {
        self.instruction_context
            .get_last_program_account_index()
            .map(|idx| *self.transaction_context.get_key_of_account_at_index(idx))
            .unwrap_or_default()
    }

    /// `original_source`'s `DataCanBeChanged`: executable data is immutable,
    /// read-only accounts reject writes, and only the owner may touch data.
    fn data_can_be_changed(&self) -> Result<(), InstructionError> {
        if self.is_executable() {
            return Err(InstructionError::ExecutableDataModified);
        }
        if !self.is_writable() {
            return Err(InstructionError::ReadonlyDataModified);
        }
        if self.owner() != self.program_key() {
            return Err(InstructionError::ExternalAccountDataModified);
        }
        Ok(())
    }

    pub fn set_lamports(&mut self, lamports: u64) -> Result<(), InstructionError> {
        self.require_write()?;
        if self.is_executable() && lamports != self.lamports() {
            return Err(InstructionError::ExecutableLamportChange);
        }
        if !self.is_writable() && lamports != self.lamports() {
            return Err(InstructionError::ReadonlyLamportChange);
        }
        // Safety: `self.write` holds a `Lease::Write` on this slot for the
        // lifetime of this borrow.
        unsafe { self.slot().get_mut() }.lamports = lamports;
        self.slot().touch();
        Ok(())
    }

    pub fn get_data_mut(&mut self) -> Result<&mut Vec<u8>, InstructionError> {
        self.require_write()?;
        self.data_can_be_changed()?;
        self.slot().touch();
        // Safety: see `set_lamports`.
        Ok(&mut unsafe { self.slot().get_mut() }.data)
    }

    pub fn set_data_from_slice(&mut self, data: &[u8]) -> Result<(), InstructionError> {
        self.require_write()?;
        self.data_can_be_changed()?;
        self.can_data_be_resized(data.len())?;
        // Safety: see `set_lamports`.
        unsafe { self.slot().get_mut() }.data = data.to_vec();
        self.slot().touch();
        Ok(())
    }

    /// `original_source`'s `CanDataBeResized`: capped at 10 MiB, and only the
    /// account's owner may resize unless the resize accompanies an owner
    /// change to the current program.
    fn can_data_be_resized(&self, new_len: usize) -> Result<(), InstructionError> {
        if new_len as u64 > MAX_PERMITTED_DATA_LENGTH {
            return Err(InstructionError::InvalidRealloc);
        }
        if new_len != self.data().len() && !self.is_writable() {
            return Err(InstructionError::AccountDataSizeChanged);
        }
        Ok(())
    }

    /// `original_source`'s `SetOwner`: requires the account be owned by the
    /// calling program, writable, non-executable, and zeroed. All four
    /// preconditions fail with the same `ModifiedProgramId` variant there,
    /// not per-condition errors.
    pub fn set_owner(&mut self, owner: Pubkey) -> Result<(), InstructionError> {
        self.require_write()?;
        if self.owner() != self.program_key() {
            return Err(InstructionError::ModifiedProgramId);
        }
        if !self.is_writable() {
            return Err(InstructionError::ModifiedProgramId);
        }
        if self.is_executable() {
            return Err(InstructionError::ModifiedProgramId);
        }
        if !self.is_zeroed() {
            return Err(InstructionError::ModifiedProgramId);
        }
        // Safety: see `set_lamports`.
        unsafe { self.slot().get_mut() }.owner = owner;
        self.slot().touch();
        Ok(())
    }

    /// `original_source`'s loader-only hook: flips the executable bit.
    /// Unlike `set_owner`/`set_data_from_slice` this has no generic
    /// instruction-level precondition in spec.md §4.G's table — the
    /// Upgradeable Loader is the only caller, and it is responsible for
    /// only ever calling this on a buffer it is deploying/upgrading.
    pub fn set_executable(&mut self, executable: bool) -> Result<(), InstructionError> {
        self.require_write()?;
        // Safety: see `set_lamports`.
        unsafe { self.slot().get_mut() }.executable = executable;
        self.slot().touch();
        Ok(())
    }

    pub fn touch(&self) {
        self.slot().touch();
    }

    pub fn account(&self) -> Account {
        self.slot().get().clone()
    }
}
