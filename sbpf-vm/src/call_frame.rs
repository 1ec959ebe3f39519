//! Call/return stack for `CALL`/`EXIT` (spec.md §4.D "Call/return").

#[derive(Clone, Copy, Debug, Default)]
pub struct CallFrame {
    /// `r6..=r9`, saved by the callee across a `CALL`.
    pub saved_registers: [u64; 4],
    pub frame_pointer: u64,
    /// Slot to resume at when the callee `EXIT`s.
    pub return_pc: u64,
}
