//! spec.md §8's `Loader.*` scenarios, driven directly against
//! `replay_builtins::bpf_loader::processor::process_instruction` with a
//! hand-pushed `TransactionContext` instruction frame — these four don't
//! need the full dispatcher, just the processor's account-precondition and
//! state-transition behavior.

use {
    replay_builtins::bpf_loader::{processor, UpgradeableLoaderInstruction, UpgradeableLoaderState},
    replay_program_runtime::{ComputeBudget, InvokeContext},
    replay_sdk::{clock::Clock, instruction_error::InstructionError, Account, Pubkey},
    replay_sysvar::SysvarCache,
    replay_transaction_context::{InstructionAccount, TransactionContext},
    std::collections::HashMap,
};

struct MapLoader(HashMap<Pubkey, Account>);

impl replay_sdk::AccountLoader for MapLoader {
    fn get_account(&self, pubkey: &Pubkey) -> Option<Account> {
        self.0.get(pubkey).cloned()
    }
}

fn sysvars_with_clock_slot(slot: u64) -> SysvarCache {
    let mut accounts = HashMap::new();
    let mut account = Account::new(1, 40, &replay_sysvar::clock::id());
    let clock = Clock { slot, ..Default::default() };
    replay_sysvar::clock::to_account(&clock, &mut account).unwrap();
    accounts.insert(replay_sysvar::clock::id(), account);
    SysvarCache::fill(&MapLoader(accounts))
}

fn instruction_account(index_in_transaction: u16, is_signer: bool, is_writable: bool) -> InstructionAccount {
    InstructionAccount {
        index_in_transaction,
        index_in_caller: index_in_transaction,
        index_in_callee: index_in_transaction,
        is_signer,
        is_writable,
    }
}

#[test]
fn initialize_buffer_success() {
    let loader_id = Pubkey::new_from_array([0xBFu8; 32]);
    let buffer_key = Pubkey::new_from_array([1u8; 32]);
    let authority_key = Pubkey::new_from_array([2u8; 32]);

    let buffer_account = Account::new(0, 500, &loader_id);
    let authority_account = Account::default();

    let txn = TransactionContext::new(
        vec![loader_id, buffer_key, authority_key],
        vec![Account::default(), buffer_account, authority_account],
        1_000_000,
    );
    txn.push(
        vec![0],
        vec![instruction_account(1, false, true), instruction_account(2, true, false)],
        UpgradeableLoaderInstruction::InitializeBuffer.serialize().unwrap(),
    )
    .unwrap();

    let sysvars = SysvarCache::default();
    let ctx = InvokeContext::new(&txn, &sysvars, None, ComputeBudget::default());
    let result = processor::process_instruction(&ctx);
    assert!(result.is_ok(), "{result:?}");

    let instruction_context = txn.get_current_instruction_context().unwrap();
    let buffer = txn.try_borrow_account(&instruction_context, 1, false).unwrap();
    let state = UpgradeableLoaderState::deserialize(buffer.data()).unwrap();
    assert_eq!(state, UpgradeableLoaderState::Buffer { authority_address: Some(authority_key) });
    drop(buffer);
    drop(instruction_context);
    txn.pop(true).unwrap();
}

#[test]
fn initialize_buffer_already_initialized() {
    let loader_id = Pubkey::new_from_array([0xBFu8; 32]);
    let buffer_key = Pubkey::new_from_array([1u8; 32]);
    let authority_key = Pubkey::new_from_array([2u8; 32]);

    let mut buffer_data = vec![0u8; 500];
    UpgradeableLoaderState::Buffer { authority_address: Some(authority_key) }
        .serialize_into(&mut buffer_data)
        .unwrap();
    let buffer_account = Account { lamports: 0, data: buffer_data, owner: loader_id, executable: false, rent_epoch: 0 };

    let txn = TransactionContext::new(
        vec![loader_id, buffer_key, authority_key],
        vec![Account::default(), buffer_account, Account::default()],
        1_000_000,
    );
    txn.push(
        vec![0],
        vec![instruction_account(1, false, true), instruction_account(2, true, false)],
        UpgradeableLoaderInstruction::InitializeBuffer.serialize().unwrap(),
    )
    .unwrap();

    let sysvars = SysvarCache::default();
    let ctx = InvokeContext::new(&txn, &sysvars, None, ComputeBudget::default());
    let result = processor::process_instruction(&ctx);
    assert_eq!(result.unwrap_err(), InstructionError::AccountAlreadyInitialized);
    txn.pop(false).unwrap();
}

#[test]
fn write_offset_too_large() {
    let loader_id = Pubkey::new_from_array([0xBFu8; 32]);
    let buffer_key = Pubkey::new_from_array([1u8; 32]);
    let authority_key = Pubkey::new_from_array([2u8; 32]);

    let mut buffer_data = vec![0u8; 500];
    UpgradeableLoaderState::Buffer { authority_address: Some(authority_key) }
        .serialize_into(&mut buffer_data)
        .unwrap();
    let buffer_account = Account { lamports: 0, data: buffer_data, owner: loader_id, executable: false, rent_epoch: 0 };

    let txn = TransactionContext::new(
        vec![loader_id, buffer_key, authority_key],
        vec![Account::default(), buffer_account, Account::default()],
        1_000_000,
    );
    txn.push(
        vec![0],
        vec![instruction_account(1, false, true), instruction_account(2, true, false)],
        UpgradeableLoaderInstruction::Write { offset: 600, bytes: vec![0u8; 100] }.serialize().unwrap(),
    )
    .unwrap();

    let sysvars = SysvarCache::default();
    let ctx = InvokeContext::new(&txn, &sysvars, None, ComputeBudget::default());
    let result = processor::process_instruction(&ctx);
    assert_eq!(result.unwrap_err(), InstructionError::AccountDataTooSmall);
    txn.pop(false).unwrap();
}

#[test]
fn close_program_data_same_slot() {
    let loader_id = Pubkey::new_from_array([0xBFu8; 32]);
    let programdata_key = Pubkey::new_from_array([1u8; 32]);
    let recipient_key = Pubkey::new_from_array([2u8; 32]);
    let authority_key = Pubkey::new_from_array([3u8; 32]);

    let mut programdata_data = vec![0u8; 200];
    UpgradeableLoaderState::ProgramData { slot: 1337, upgrade_authority_address: Some(authority_key) }
        .serialize_into(&mut programdata_data)
        .unwrap();
    let programdata_account =
        Account { lamports: 10, data: programdata_data, owner: loader_id, executable: false, rent_epoch: 0 };

    let txn = TransactionContext::new(
        vec![loader_id, programdata_key, recipient_key, authority_key],
        vec![Account::default(), programdata_account, Account::default(), Account::default()],
        1_000_000,
    );
    txn.push(
        vec![0],
        vec![
            instruction_account(1, false, true),
            instruction_account(2, false, true),
            instruction_account(3, true, false),
        ],
        UpgradeableLoaderInstruction::Close.serialize().unwrap(),
    )
    .unwrap();

    let sysvars = sysvars_with_clock_slot(1337);
    let ctx = InvokeContext::new(&txn, &sysvars, None, ComputeBudget::default());
    let result = processor::process_instruction(&ctx);
    assert_eq!(result.unwrap_err(), InstructionError::InvalidArgument);
    txn.pop(false).unwrap();
}
