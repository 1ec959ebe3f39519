//! End-to-end smoke tests for the `replay-verify` scenario driver
//! (spec.md §6), exercising the System program builtin through the same
//! `run_scenario`/`process_top_level_instruction` path the CLI binary uses.

use {
    replay_builtins::{ids, system::SystemInstruction},
    replay_sdk::{instruction_error::InstructionError, Account, Pubkey},
    replay_sysvar::SysvarCache,
    replay_verify::{AccountFixture, AccountMetaFixture, Scenario},
};

fn empty_sysvars() -> SysvarCache {
    struct NoAccounts;
    impl replay_sdk::AccountLoader for NoAccounts {
        fn get_account(&self, _pubkey: &Pubkey) -> Option<Account> {
            None
        }
    }
    SysvarCache::fill(&NoAccounts)
}

#[test]
fn create_account_success() {
    let system_id = ids::system_program_id();
    let funding_key = Pubkey::new_from_array([1u8; 32]);
    let new_account_key = Pubkey::new_from_array([2u8; 32]);
    let owner = Pubkey::new_from_array([9u8; 32]);

    let instruction = SystemInstruction::CreateAccount { lamports: 1_000, space: 16, owner };
    let scenario = Scenario {
        accounts: vec![
            AccountFixture { key: system_id, account: Account::default() },
            AccountFixture { key: funding_key, account: Account::new(5_000, 0, &system_id) },
            AccountFixture { key: new_account_key, account: Account::new(0, 0, &system_id) },
        ],
        bpf_programs: vec![],
        program_id: system_id,
        instruction_accounts: vec![
            AccountMetaFixture { pubkey: funding_key, is_signer: true, is_writable: true },
            AccountMetaFixture { pubkey: new_account_key, is_signer: true, is_writable: true },
        ],
        instruction_data: bincode::serialize(&instruction).unwrap(),
        compute_unit_limit: 1_000_000,
    };

    let outcome = replay_verify::run_scenario(&scenario, &empty_sysvars()).unwrap();
    assert!(outcome.is_success(), "{outcome:?}");
}

#[test]
fn create_account_insufficient_funds() {
    let system_id = ids::system_program_id();
    let funding_key = Pubkey::new_from_array([1u8; 32]);
    let new_account_key = Pubkey::new_from_array([2u8; 32]);
    let owner = Pubkey::new_from_array([9u8; 32]);

    let instruction = SystemInstruction::CreateAccount { lamports: 10_000, space: 16, owner };
    let scenario = Scenario {
        accounts: vec![
            AccountFixture { key: system_id, account: Account::default() },
            AccountFixture { key: funding_key, account: Account::new(1, 0, &system_id) },
            AccountFixture { key: new_account_key, account: Account::default() },
        ],
        bpf_programs: vec![],
        program_id: system_id,
        instruction_accounts: vec![
            AccountMetaFixture { pubkey: funding_key, is_signer: true, is_writable: true },
            AccountMetaFixture { pubkey: new_account_key, is_signer: true, is_writable: true },
        ],
        instruction_data: bincode::serialize(&instruction).unwrap(),
        compute_unit_limit: 1_000_000,
    };

    let outcome = replay_verify::run_scenario(&scenario, &empty_sysvars()).unwrap();
    assert_eq!(outcome.error, Some(InstructionError::InsufficientFunds));
}

#[test]
fn scenario_round_trips_through_bincode() {
    let system_id = ids::system_program_id();
    let scenario = Scenario {
        accounts: vec![AccountFixture { key: system_id, account: Account::default() }],
        bpf_programs: vec![],
        program_id: system_id,
        instruction_accounts: vec![],
        instruction_data: vec![1, 2, 3],
        compute_unit_limit: 200_000,
    };
    let bytes = bincode::serialize(&scenario).unwrap();
    let decoded = replay_verify::decode_scenario(&bytes).unwrap();
    assert_eq!(decoded.instruction_data, scenario.instruction_data);
    assert_eq!(decoded.compute_unit_limit, scenario.compute_unit_limit);
}
