use {
    crate::{
        instruction_context::InstructionAccount,
        transaction_context::{TransactionContext, MAX_INSTRUCTION_STACK_DEPTH},
    },
    assert_matches::assert_matches,
    replay_sdk::{instruction_error::InstructionError, Account, Pubkey},
};

fn setup() -> (TransactionContext, Pubkey, Pubkey) {
    let program_id = Pubkey::new_from_array([1u8; 32]);
    let account_key = Pubkey::new_from_array([2u8; 32]);
    let tx_context = TransactionContext::new(
        vec![program_id, account_key],
        vec![
            Account::new(0, 0, &Pubkey::new_from_array([0xffu8; 32])),
            Account::new(10, 0, &program_id),
        ],
        200_000,
    );
    (tx_context, program_id, account_key)
}

fn setup_with_foreign_owned_account() -> (TransactionContext, Pubkey) {
    let program_id = Pubkey::new_from_array([1u8; 32]);
    let foreign_owner = Pubkey::new_from_array([3u8; 32]);
    let foreign_account = Pubkey::new_from_array([4u8; 32]);
    let tx_context = TransactionContext::new(
        vec![program_id, foreign_account],
        vec![
            Account::new(0, 0, &Pubkey::new_from_array([0xffu8; 32])),
            Account::new(10, 4, &foreign_owner),
        ],
        200_000,
    );
    (tx_context, program_id)
}

#[test]
fn push_then_pop_success_keeps_mutations() {
    let (tx_context, program_id, _account_key) = setup();
    tx_context
        .push(
            vec![0],
            vec![InstructionAccount {
                index_in_transaction: 1,
                index_in_caller: 0,
                index_in_callee: 0,
                is_signer: false,
                is_writable: true,
            }],
            vec![],
        )
        .unwrap();
    {
        let ix = tx_context.get_current_instruction_context().unwrap();
        let mut account = tx_context.try_borrow_account(&ix, 1, true).unwrap();
        account.set_lamports(42).unwrap();
    }
    tx_context.pop(true).unwrap();
    assert_eq!(tx_context.slot_at(1).get().lamports, 42);
    let _ = program_id;
}

#[test]
fn push_then_pop_failure_rolls_back_mutations() {
    let (tx_context, _program_id, _account_key) = setup();
    tx_context
        .push(
            vec![0],
            vec![InstructionAccount {
                index_in_transaction: 1,
                index_in_caller: 0,
                index_in_callee: 0,
                is_signer: false,
                is_writable: true,
            }],
            vec![],
        )
        .unwrap();
    {
        let ix = tx_context.get_current_instruction_context().unwrap();
        let mut account = tx_context.try_borrow_account(&ix, 1, true).unwrap();
        account.set_lamports(999).unwrap();
    }
    tx_context.pop(false).unwrap();
    assert_eq!(tx_context.slot_at(1).get().lamports, 10);
}

#[test]
fn call_depth_is_bounded() {
    let (tx_context, _program_id, _account_key) = setup();
    for _ in 0..MAX_INSTRUCTION_STACK_DEPTH {
        tx_context.push(vec![0], vec![], vec![]).unwrap();
    }
    assert_matches!(
        tx_context.push(vec![0], vec![], vec![]),
        Err(InstructionError::CallDepth)
    );
}

#[test]
fn double_write_borrow_fails() {
    let (tx_context, _program_id, _account_key) = setup();
    tx_context.push(vec![0], vec![], vec![]).unwrap();
    let ix = tx_context.get_current_instruction_context().unwrap();
    let _first = tx_context.try_borrow_account(&ix, 0, true).unwrap();
    assert_matches!(
        tx_context.try_borrow_account(&ix, 0, true),
        Err(InstructionError::AccountBorrowFailed)
    );
}

#[test]
fn concurrent_reads_are_allowed() {
    let (tx_context, _program_id, _account_key) = setup();
    tx_context.push(vec![0], vec![], vec![]).unwrap();
    let ix = tx_context.get_current_instruction_context().unwrap();
    let first = tx_context.try_borrow_account(&ix, 0, false).unwrap();
    let second = tx_context.try_borrow_account(&ix, 0, false).unwrap();
    assert_eq!(first.lamports(), second.lamports());
}

#[test]
fn return_data_round_trips() {
    let (tx_context, program_id, _account_key) = setup();
    tx_context
        .set_return_data(program_id, vec![1, 2, 3])
        .unwrap();
    let (key, data) = tx_context.get_return_data();
    assert_eq!(key, program_id);
    assert_eq!(data, vec![1, 2, 3]);
}

#[test]
fn compute_meter_errors_on_exhaustion() {
    let (tx_context, _program_id, _account_key) = setup();
    tx_context.consume_compute_units(199_999).unwrap();
    assert_matches!(
        tx_context.consume_compute_units(2),
        Err(InstructionError::ComputationalBudgetExceeded)
    );
    assert_eq!(tx_context.remaining_compute_units(), 0);
}

#[test]
fn external_account_data_modification_is_rejected() {
    let (tx_context, _program_id) = setup_with_foreign_owned_account();
    tx_context
        .push(
            vec![0],
            vec![InstructionAccount {
                index_in_transaction: 1,
                index_in_caller: 0,
                index_in_callee: 0,
                is_signer: false,
                is_writable: true,
            }],
            vec![],
        )
        .unwrap();
    let ix = tx_context.get_current_instruction_context().unwrap();
    // index 1 is writable but owned by a different program than the one
    // executing (account index 0), so writes through it must be rejected.
    let mut account = tx_context.try_borrow_account(&ix, 1, true).unwrap();
    assert_matches!(
        account.set_data_from_slice(&[1, 2, 3]),
        Err(InstructionError::ExternalAccountDataModified)
    );
}
