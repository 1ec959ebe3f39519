//! Reasons the runtime can reject an instruction (spec.md §7,
//! "Instruction errors"). This is deliberately close to the teacher's
//! `solana_instruction::error::InstructionError`: members of this enum must
//! not be removed or renumbered once seen by a conformance fixture, since
//! exact tag matching against a reference implementation is the whole point
//! of the verifier.

use {serde::{Deserialize, Serialize}, thiserror::Error};

#[derive(Serialize, Deserialize, Debug, Error, PartialEq, Eq, Clone)]
pub enum InstructionError {
    #[error("generic instruction error")]
    GenericError,

    #[error("invalid program argument")]
    InvalidArgument,

    #[error("invalid instruction data")]
    InvalidInstructionData,

    #[error("invalid account data for instruction")]
    InvalidAccountData,

    #[error("account data too small for instruction")]
    AccountDataTooSmall,

    #[error("insufficient funds for instruction")]
    InsufficientFunds,

    #[error("incorrect program id for instruction")]
    IncorrectProgramId,

    #[error("missing required signature for instruction")]
    MissingRequiredSignature,

    #[error("instruction requires an uninitialized account")]
    AccountAlreadyInitialized,

    #[error("instruction requires an initialized account")]
    UninitializedAccount,

    #[error("instruction illegally modified the program id of an account")]
    ModifiedProgramId,

    #[error("instruction spent from the balance of an account it does not own")]
    ExternalAccountLamportSpend,

    #[error("instruction modified data of an account it does not own")]
    ExternalAccountDataModified,

    #[error("instruction changed the balance of a read-only account")]
    ReadonlyLamportChange,

    #[error("instruction modified data of a read-only account")]
    ReadonlyDataModified,

    #[error("instruction changed executable bit of an account")]
    ExecutableModified,

    #[error("instruction modified rent epoch of an account")]
    RentEpochModified,

    #[error("insufficient account keys for instruction")]
    NotEnoughAccountKeys,

    #[error("program other than the account's owner changed the size of the account data")]
    AccountDataSizeChanged,

    #[error("instruction expected an executable account")]
    AccountNotExecutable,

    #[error("instruction tries to borrow reference for an account which is already borrowed")]
    AccountBorrowFailed,

    #[error("instruction left account with an outstanding borrowed reference")]
    AccountBorrowOutstanding,

    #[error("custom program error: {0:#x}")]
    Custom(u32),

    #[error("program returned invalid error code")]
    InvalidError,

    #[error("instruction changed executable accounts data")]
    ExecutableDataModified,

    #[error("instruction changed the balance of an executable account")]
    ExecutableLamportChange,

    #[error("executable accounts must be rent exempt")]
    ExecutableAccountNotRentExempt,

    #[error("Cross-program invocation call depth too deep")]
    CallDepth,

    #[error("An account required by the instruction is missing")]
    MissingAccount,

    #[error("Length of the seed is too long for address generation")]
    MaxSeedLengthExceeded,

    #[error("Provided seeds do not result in a valid address")]
    InvalidSeeds,

    #[error("Failed to reallocate account data of this length")]
    InvalidRealloc,

    #[error("Computational budget exceeded")]
    ComputationalBudgetExceeded,

    #[error("Cross-program invocation with unauthorized signer or writable account")]
    PrivilegeEscalation,

    #[error("Program failed to complete")]
    ProgramFailedToComplete,

    #[error("Account is immutable")]
    Immutable,

    #[error("Incorrect authority provided")]
    IncorrectAuthority,

    #[error("An account does not have enough lamports to be rent-exempt")]
    AccountNotRentExempt,

    #[error("Invalid account owner")]
    InvalidAccountOwner,

    #[error("Program arithmetic overflowed")]
    ArithmeticOverflow,

    #[error("Unsupported sysvar")]
    UnsupportedSysvar,

    #[error("Accounts data allocations exceeded the maximum allowed per transaction")]
    MaxAccountsDataAllocationsExceeded,

    #[error("Max instruction trace length exceeded")]
    MaxInstructionTraceLengthExceeded,

    #[error("Builtin programs must consume compute units")]
    BuiltinProgramsMustConsumeComputeUnits,
}

impl InstructionError {
    /// Whether this error should unwind the whole transaction rather than
    /// just the current instruction's subtree (spec.md §7 propagation
    /// rules: nested-invocation failures force rollback of their subtree,
    /// but some conditions — compute exhaustion, call-depth — are fatal at
    /// every level above them too). All current variants are subtree-scoped;
    /// this hook exists for the day a transaction-wide-fatal variant is
    /// added.
    pub fn is_fatal(&self) -> bool {
        false
    }
}
