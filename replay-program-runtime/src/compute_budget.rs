//! Reference compute-unit costs (spec.md §4.D/§4.E). A plain struct of
//! `u64` fields threaded through [`crate::invoke_context::InvokeContext`]
//! rather than a process-global, matching the teacher's
//! `solana-compute-budget` crate.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComputeBudget {
    /// Total compute units available to a transaction (spec.md §8 invariant
    /// 5: "cu_charged ≤ cu_budget_at_start").
    pub compute_unit_limit: u64,
    /// Flat cost of most syscalls before any length-proportional charge.
    pub syscall_base_cost: u64,
    pub log_64_units: u64,
    pub log_pubkey_units: u64,
    pub create_program_address_units: u64,
    pub invoke_units: u64,
    pub max_call_depth: usize,
    pub stack_frame_size: usize,
    pub max_invoke_stack_height: usize,
    pub heap_size: u32,
    pub heap_cost: u64,
    pub mem_op_base_cost: u64,
    pub cpi_bytes_per_unit: u64,
    pub sha256_base_cost: u64,
    pub sha256_byte_cost: u64,
    /// Flat cost charged by the Upgradeable Loader before decoding any
    /// instruction (spec.md §4.I: "charge the documented fixed CU cost
    /// first").
    pub loader_default_units: u64,
    pub config_program_default_units: u64,
    pub system_program_default_units: u64,
}

impl Default for ComputeBudget {
    fn default() -> Self {
        Self {
            compute_unit_limit: 1_400_000,
            syscall_base_cost: 100,
            log_64_units: 100,
            log_pubkey_units: 100,
            create_program_address_units: 1_500,
            invoke_units: 1_000,
            max_call_depth: 64,
            stack_frame_size: 4_096,
            max_invoke_stack_height: 5,
            heap_size: 32 * 1024,
            heap_cost: 8,
            mem_op_base_cost: 10,
            cpi_bytes_per_unit: 250,
            sha256_base_cost: 85,
            sha256_byte_cost: 1,
            loader_default_units: 2_370,
            config_program_default_units: 450,
            system_program_default_units: 150,
        }
    }
}
