//! Per-transaction account table plus the instruction-context stack
//! (spec.md §4.H). Owns account storage; `InstructionContext`/
//! `BorrowedAccount` only ever hold indices into it.

use {
    crate::{
        account_slot::AccountSlot,
        borrowed_account::BorrowedAccount,
        instruction_context::{InstructionAccount, InstructionContext},
    },
    replay_sdk::{instruction_error::InstructionError, Account, Pubkey},
    std::cell::{Cell, RefCell},
};

pub use crate::instruction_context::IndexOfAccount;

/// Typical Sealevel call-depth cap (spec.md §4.H, "Non-goals" carve-out
/// aside: CPI depth itself is in scope and bounded here).
pub const MAX_INSTRUCTION_STACK_DEPTH: usize = 5;

pub struct TransactionContext {
    account_keys: Vec<Pubkey>,
    slots: Vec<AccountSlot>,
    instruction_stack: RefCell<Vec<InstructionContext>>,
    /// Account snapshots taken at each `push`, restored on the matching
    /// `pop` if that instruction's subtree failed.
    snapshots: RefCell<Vec<Vec<(IndexOfAccount, Account)>>>,
    instruction_trace: RefCell<Vec<InstructionContext>>,
    return_data: RefCell<(Pubkey, Vec<u8>)>,
    compute_meter: Cell<u64>,
}

impl TransactionContext {
    pub fn new(account_keys: Vec<Pubkey>, accounts: Vec<Account>, compute_units: u64) -> Self {
        let slots = accounts.into_iter().map(AccountSlot::new).collect();
        Self {
            account_keys,
            slots,
            instruction_stack: RefCell::new(Vec::new()),
            snapshots: RefCell::new(Vec::new()),
            instruction_trace: RefCell::new(Vec::new()),
            return_data: RefCell::new((Pubkey::default(), Vec::new())),
            compute_meter: Cell::new(compute_units),
        }
    }

    pub(crate) fn slot_at(&self, index: IndexOfAccount) -> &AccountSlot {
        &self.slots[index as usize]
    }

    pub(crate) fn release_account(&self, index: IndexOfAccount, write: bool) {
        self.slots[index as usize].release(write);
    }

    pub fn get_number_of_accounts(&self) -> IndexOfAccount {
        self.slots.len() as IndexOfAccount
    }

    pub fn get_key_of_account_at_index(&self, index: IndexOfAccount) -> &Pubkey {
        &self.account_keys[index as usize]
    }

    pub fn find_index_of_account(&self, pubkey: &Pubkey) -> Option<IndexOfAccount> {
        self.account_keys
            .iter()
            .position(|k| k == pubkey)
            .map(|i| i as IndexOfAccount)
    }

    pub fn get_instruction_context_stack_height(&self) -> usize {
        self.instruction_stack.borrow().len()
    }

    pub fn get_current_instruction_context(
        &self,
    ) -> Result<std::cell::Ref<'_, InstructionContext>, InstructionError> {
        let stack = self.instruction_stack.borrow();
        if stack.is_empty() {
            return Err(InstructionError::CallDepth);
        }
        Ok(std::cell::Ref::map(stack, |s| s.last().unwrap()))
    }

    /// Leases the account at `index_in_instruction` for the instruction
    /// currently on top of the stack.
    pub fn try_borrow_account(
        &self,
        instruction_context: &InstructionContext,
        index_in_instruction: IndexOfAccount,
        write: bool,
    ) -> Result<BorrowedAccount<'_>, InstructionError> {
        let index_in_transaction =
            instruction_context.get_index_in_transaction(index_in_instruction)?;
        self.slots[index_in_transaction as usize].try_acquire(write)?;
        Ok(BorrowedAccount::new(
            self,
            instruction_context,
            index_in_transaction,
            index_in_instruction,
            write,
        ))
    }

    /// Pushes a new instruction context onto the stack, snapshotting the
    /// accounts it touches so a failure can roll them back on `pop`
    /// (spec.md §3: "on exhaustion the instruction fails and state is
    /// reverted to the snapshot at push-time").
    pub fn push(
        &self,
        program_accounts: Vec<IndexOfAccount>,
        instruction_accounts: Vec<InstructionAccount>,
        instruction_data: Vec<u8>,
    ) -> Result<(), InstructionError> {
        let nesting_level = self.instruction_stack.borrow().len();
        if nesting_level >= MAX_INSTRUCTION_STACK_DEPTH {
            return Err(InstructionError::CallDepth);
        }
        let mut snapshot = Vec::with_capacity(
            program_accounts
                .len()
                .saturating_add(instruction_accounts.len()),
        );
        for &idx in program_accounts.iter() {
            snapshot.push((idx, self.slots[idx as usize].snapshot()));
        }
        for account in instruction_accounts.iter() {
            snapshot.push((
                account.index_in_transaction,
                self.slots[account.index_in_transaction as usize].snapshot(),
            ));
        }
        let instruction_context = InstructionContext::new(
            nesting_level,
            program_accounts,
            instruction_accounts,
            instruction_data,
        );
        self.instruction_stack.borrow_mut().push(instruction_context);
        self.snapshots.borrow_mut().push(snapshot);
        Ok(())
    }

    /// Pops the instruction context on top of the stack. On failure, every
    /// account snapshotted at the matching `push` is restored; on success
    /// the dirty accounts are left as the instruction (and its completed
    /// nested invocations) left them.
    pub fn pop(&self, succeeded: bool) -> Result<(), InstructionError> {
        let instruction_context = self
            .instruction_stack
            .borrow_mut()
            .pop()
            .ok_or(InstructionError::CallDepth)?;
        let snapshot = self
            .snapshots
            .borrow_mut()
            .pop()
            .ok_or(InstructionError::CallDepth)?;
        if !succeeded {
            for (index, account) in snapshot {
                self.slots[index as usize].restore(account);
            }
        }
        self.instruction_trace.borrow_mut().push(instruction_context);
        Ok(())
    }

    pub fn instruction_trace(&self) -> std::cell::Ref<'_, Vec<InstructionContext>> {
        self.instruction_trace.borrow()
    }

    /// Sets return data; `program_id` must be the key of the program
    /// currently executing (spec.md §3: return data "belongs to the program
    /// that was executing when set").
    pub fn set_return_data(
        &self,
        program_id: Pubkey,
        data: Vec<u8>,
    ) -> Result<(), InstructionError> {
        *self.return_data.borrow_mut() = (program_id, data);
        Ok(())
    }

    pub fn get_return_data(&self) -> (Pubkey, Vec<u8>) {
        self.return_data.borrow().clone()
    }

    pub fn remaining_compute_units(&self) -> u64 {
        self.compute_meter.get()
    }

    pub fn consume_compute_units(&self, amount: u64) -> Result<(), InstructionError> {
        let remaining = self.compute_meter.get();
        match remaining.checked_sub(amount) {
            Some(left) => {
                self.compute_meter.set(left);
                Ok(())
            }
            None => {
                self.compute_meter.set(0);
                Err(InstructionError::ComputationalBudgetExceeded)
            }
        }
    }

    pub fn account_keys(&self) -> &[Pubkey] {
        &self.account_keys
    }
}
