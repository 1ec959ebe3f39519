//! Scenario fixture format and replay driver backing the `replay-verify`
//! binary (spec.md §6 "CLI surface (the verifier harness)").
//!
//! The snapshot reader and on-disk account index are out of scope (spec.md
//! §1 Non-goals: only the `GetAccount(Pubkey) -> Account` boundary is
//! named), so `--snapshot`/`--accountsdb` here are bincode-encoded account
//! tables standing in for that external store — used only to fill the
//! [`SysvarCache`], since the transaction's own accounts travel inline in
//! the scenario fixture at `--path`. This split mirrors spec.md §4's "the
//! sysvar accounts are conceptually global" framing: global world state
//! comes from the snapshot tier, the replayed transaction's own account set
//! is supplied by the caller.

use {
    replay_builtins::{make_dispatcher, process_top_level_instruction, ProgramCache},
    replay_program_runtime::{ComputeBudget, InvokeContext, LogCollector},
    replay_sdk::{
        instruction_error::InstructionError, Account, AccountLoader, AccountMeta, Instruction, Pubkey,
    },
    replay_sysvar::SysvarCache,
    replay_transaction_context::TransactionContext,
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
};

/// One account the scenario's transaction touches, keyed by its `Pubkey`
/// (the fixture's wire form of `TransactionContext::new`'s parallel
/// `account_keys`/`accounts` vectors).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountFixture {
    pub key: Pubkey,
    pub account: Account,
}

/// Wire form of `replay_sdk::AccountMeta` (that type itself isn't
/// `Serialize`, since nothing else in the workspace needs it on the wire).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountMetaFixture {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// A BPF program image to link into the scenario's `ProgramCache` before
/// replay, keyed by the program id the instruction addresses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BpfProgramFixture {
    pub program_id: Pubkey,
    pub elf: Vec<u8>,
}

/// The single instruction `replay-verify` replays, plus every account it
/// touches and any BPF program images it needs loaded first (spec.md §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub accounts: Vec<AccountFixture>,
    pub bpf_programs: Vec<BpfProgramFixture>,
    pub program_id: Pubkey,
    pub instruction_accounts: Vec<AccountMetaFixture>,
    pub instruction_data: Vec<u8>,
    pub compute_unit_limit: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("failed to decode scenario: {0}")]
    Decode(#[from] bincode::Error),
    #[error("failed to link BPF program {0}: {1}")]
    Elf(Pubkey, sbpf_loader::ElfError),
    #[error(transparent)]
    Instruction(#[from] InstructionError),
}

/// Result of a single replayed instruction: spec.md §6 requires the CLI to
/// print one structured line naming the tag, so this captures the failing
/// variant's name directly rather than its `Display` message.
#[derive(Debug, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub log: Vec<String>,
    pub error: Option<InstructionError>,
}

impl VerifyOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// In-memory stand-in for the snapshot/accountsdb tiers (spec.md's
/// `GetAccount(key) -> Account` external collaborator boundary), built by
/// merging `--accountsdb` over `--snapshot`.
pub struct MapAccountLoader(pub HashMap<Pubkey, Account>);

impl AccountLoader for MapAccountLoader {
    fn get_account(&self, pubkey: &Pubkey) -> Option<Account> {
        self.0.get(pubkey).cloned()
    }
}

pub fn decode_account_table(bytes: &[u8]) -> Result<HashMap<Pubkey, Account>, VerifyError> {
    if bytes.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(bincode::deserialize(bytes)?)
}

pub fn decode_scenario(bytes: &[u8]) -> Result<Scenario, VerifyError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Replays `scenario`'s single instruction to completion against a fresh
/// `TransactionContext`, pushing/popping exactly the way
/// `process_top_level_instruction` does for any other top-level call.
pub fn run_scenario(scenario: &Scenario, sysvars: &SysvarCache) -> Result<VerifyOutcome, VerifyError> {
    let account_keys: Vec<Pubkey> = scenario.accounts.iter().map(|a| a.key).collect();
    let accounts: Vec<Account> = scenario.accounts.iter().map(|a| a.account.clone()).collect();
    let txn = TransactionContext::new(account_keys, accounts, scenario.compute_unit_limit);

    let mut cache = ProgramCache::new();
    for program in &scenario.bpf_programs {
        cache
            .load_bpf(program.program_id, program.elf.clone())
            .map_err(|e| VerifyError::Elf(program.program_id, e))?;
    }

    let log_collector = LogCollector::new_ref(Some(10_000));
    let dispatcher = make_dispatcher(&cache);
    let mut ctx = InvokeContext::new(&txn, sysvars, Some(log_collector.clone()), ComputeBudget::default())
        .with_dispatcher(&dispatcher);

    let instruction = Instruction {
        program_id: scenario.program_id,
        accounts: scenario
            .instruction_accounts
            .iter()
            .map(|m| {
                if m.is_writable {
                    AccountMeta::new(m.pubkey, m.is_signer)
                } else {
                    AccountMeta::new_readonly(m.pubkey, m.is_signer)
                }
            })
            .collect(),
        data: scenario.instruction_data.clone(),
    };

    let result = process_top_level_instruction(&mut ctx, &cache, &instruction);
    let log = log_collector.borrow().get_recorded_content().to_vec();
    match result {
        Ok(()) => Ok(VerifyOutcome { log, error: None }),
        Err(e) => Ok(VerifyOutcome { log, error: Some(e) }),
    }
}
