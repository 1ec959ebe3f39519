//! The per-account borrow ledger entry: account storage plus a lease
//! counter enforcing spec.md §3's "every writable borrow is unique" and
//! §4.G's borrow preconditions.

use {
    replay_sdk::{instruction_error::InstructionError, Account},
    std::cell::{Cell, UnsafeCell},
};

pub use replay_sdk::account::MAX_PERMITTED_DATA_LENGTH;

#[derive(Clone, Copy, Debug)]
enum Lease {
    Free,
    Read(u32),
    Write,
}

pub(crate) struct AccountSlot {
    account: UnsafeCell<Account>,
    lease: Cell<Lease>,
    dirty: Cell<bool>,
}

impl AccountSlot {
    pub(crate) fn new(account: Account) -> Self {
        Self {
            account: UnsafeCell::new(account),
            lease: Cell::new(Lease::Free),
            dirty: Cell::new(false),
        }
    }

    /// # Safety invariant
    /// Only valid while the caller holds a lease acquired through
    /// `try_acquire`; callers never keep the returned reference alive past
    /// the lease's `release` call, which `BorrowedAccount`'s `Drop` impl
    /// enforces.
    pub(crate) fn try_acquire(&self, write: bool) -> Result<(), InstructionError> {
        let next = match (self.lease.get(), write) {
            (Lease::Free, true) => Lease::Write,
            (Lease::Free, false) => Lease::Read(1),
            (Lease::Read(n), false) => Lease::Read(n.saturating_add(1)),
            _ => return Err(InstructionError::AccountBorrowFailed),
        };
        self.lease.set(next);
        Ok(())
    }

    pub(crate) fn release(&self, write: bool) {
        let next = match (self.lease.get(), write) {
            (Lease::Write, true) => Lease::Free,
            (Lease::Read(n), false) if n <= 1 => Lease::Free,
            (Lease::Read(n), false) => Lease::Read(n.saturating_sub(1)),
            (other, _) => other,
        };
        self.lease.set(next);
    }

    pub(crate) fn get(&self) -> &Account {
        // Safe: only ever called while at least a read lease is held.
        unsafe { &*self.account.get() }
    }

    /// # Safety
    /// Caller must hold a write lease (`Lease::Write`) for the duration of
    /// the returned borrow.
    pub(crate) unsafe fn get_mut(&self) -> &mut Account {
        &mut *self.account.get()
    }

    pub(crate) fn touch(&self) {
        self.dirty.set(true);
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn clear_dirty(&self) {
        self.dirty.set(false);
    }

    pub(crate) fn snapshot(&self) -> Account {
        self.get().clone()
    }

    pub(crate) fn restore(&self, snapshot: Account) {
        // Safe: called only from `TransactionContext::pop`, which holds no
        // outstanding lease on this slot (instruction already fully failed
        // and its borrows were all dropped by the time we roll back).
        unsafe {
            *self.account.get() = snapshot;
        }
    }
}
