//! VM configuration (spec.md §4.C, §4.D). Grounded on the teacher's
//! `vm::Config`, trimmed to the knobs this interpreter actually reads: JIT
//! and tracing knobs from the teacher have no counterpart here.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum call stack depth (spec.md §4.D "typical depth 64").
    pub max_call_depth: usize,
    /// Size in bytes of a single fixed-size stack frame.
    pub stack_frame_size: usize,
    /// Maximum heap size in bytes (spec.md §4.C "default 32 KiB").
    pub heap_max: usize,
}

impl Config {
    pub fn stack_size(&self) -> usize {
        self.stack_frame_size * self.max_call_depth
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            stack_frame_size: 4_096,
            heap_max: 32 * 1024,
        }
    }
}
