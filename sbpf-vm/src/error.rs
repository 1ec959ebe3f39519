//! VM fault taxonomy (spec.md §7, "VM faults"). One variant per distinct
//! way the interpreter or a syscall handler can abort a program.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EbpfError {
    #[error("access violation: {0} at {1:#x}, length {2}")]
    AccessViolation(AccessType, u64, u64),

    #[error("division by zero")]
    DivideByZero,

    #[error("invalid opcode {0:#x}")]
    InvalidOpcode(u8),

    #[error("exceeded maximum number of instructions")]
    ExceededMaxInstructions,

    #[error("stack overflow")]
    StackOverflow,

    #[error("overlapping copy")]
    OverlappingCopy,

    #[error("invalid string")]
    InvalidString,

    #[error("call depth exceeded")]
    CallDepthExceeded,

    #[error("unresolved function hash {0:#x}")]
    UnresolvedFunction(u32),

    #[error("exit from an empty call stack")]
    ExitFromTopLevel,

    #[error("program panicked: {0}:{1}")]
    Panic(String, u64),

    #[error("cross-program invocation failed: {0}")]
    CpiFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}

impl std::fmt::Display for AccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessType::Read => write!(f, "read"),
            AccessType::Write => write!(f, "write"),
        }
    }
}
