//! Upgradeable Loader processor (spec.md §4.I). Each entry point charges
//! the loader's fixed CU cost first, decodes the instruction, validates
//! accounts against the precondition table in spec.md §4.F/4.G, then
//! mutates. Account conventions (positional, no signer for the program id
//! itself — the program id is the instruction's `program_id`, never one of
//! its own accounts) follow spec.md §3's Instruction Account model.

use {
    super::{instruction::UpgradeableLoaderInstruction, state::UpgradeableLoaderState},
    replay_program_runtime::InvokeContext,
    replay_sdk::instruction_error::InstructionError,
    replay_transaction_context::{BorrowedAccount, IndexOfAccount, InstructionContext},
};

fn charge(ctx: &InvokeContext<'_>, amount: u64) -> Result<(), InstructionError> {
    ctx.transaction_context.consume_compute_units(amount)
}

/// Caller-supplied accounts are addressed 0-based in this module, but
/// `TransactionContext` addresses them past the program-account prefix (the
/// account(s) identifying the Upgradeable Loader program itself for this
/// invocation) — see `InstructionContext`'s doc comment. This translates.
fn ix(instruction_context: &InstructionContext, caller_index: IndexOfAccount) -> IndexOfAccount {
    instruction_context
        .get_number_of_program_accounts()
        .saturating_add(caller_index)
}

fn account_state(account: &BorrowedAccount<'_>) -> Result<UpgradeableLoaderState, InstructionError> {
    UpgradeableLoaderState::deserialize(account.data()).map_err(|_| InstructionError::InvalidAccountData)
}

pub fn process_instruction(ctx: &InvokeContext<'_>) -> Result<(), InstructionError> {
    charge(ctx, ctx.compute_budget.loader_default_units)?;

    let instruction_context = ctx.transaction_context.get_current_instruction_context()?;
    let data = instruction_context.get_instruction_data().to_vec();
    let instruction = UpgradeableLoaderInstruction::deserialize(&data)
        .map_err(|_| InstructionError::InvalidInstructionData)?;
    drop(instruction_context);

    match instruction {
        UpgradeableLoaderInstruction::InitializeBuffer => initialize_buffer(ctx),
        UpgradeableLoaderInstruction::Write { offset, bytes } => write(ctx, offset, &bytes),
        UpgradeableLoaderInstruction::DeployWithMaxDataLen { max_data_len } => {
            deploy_with_max_data_len(ctx, max_data_len)
        }
        UpgradeableLoaderInstruction::Upgrade => upgrade(ctx),
        UpgradeableLoaderInstruction::SetAuthority => set_authority(ctx, false),
        UpgradeableLoaderInstruction::SetAuthorityChecked => set_authority(ctx, true),
        UpgradeableLoaderInstruction::Close => close(ctx),
    }
}

fn initialize_buffer(ctx: &InvokeContext<'_>) -> Result<(), InstructionError> {
    let instruction_context = ctx.transaction_context.get_current_instruction_context()?;
    let mut buffer = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 0), true)?;
    let authority = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 1), false)?;

    if account_state(&buffer)? != UpgradeableLoaderState::Uninitialized {
        return Err(InstructionError::AccountAlreadyInitialized);
    }
    let authority_key = *authority.key();
    drop(authority);

    let state = UpgradeableLoaderState::Buffer { authority_address: Some(authority_key) };
    let data = buffer.get_data_mut()?;
    state.serialize_into(data).map_err(|_| InstructionError::AccountDataTooSmall)
}

fn write(ctx: &InvokeContext<'_>, offset: u32, bytes: &[u8]) -> Result<(), InstructionError> {
    let instruction_context = ctx.transaction_context.get_current_instruction_context()?;
    let mut buffer = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 0), true)?;
    let authority = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 1), false)?;

    match account_state(&buffer)? {
        UpgradeableLoaderState::Buffer { authority_address: Some(expected) } => {
            if !authority.is_signer() {
                return Err(InstructionError::MissingRequiredSignature);
            }
            if *authority.key() != expected {
                return Err(InstructionError::IncorrectAuthority);
            }
        }
        UpgradeableLoaderState::Buffer { authority_address: None } => {
            return Err(InstructionError::Immutable);
        }
        _ => return Err(InstructionError::InvalidAccountData),
    }
    drop(authority);

    let start = UpgradeableLoaderState::BUFFER_METADATA_SIZE
        .saturating_add(offset as usize);
    let end = start.saturating_add(bytes.len());
    let data = buffer.get_data_mut()?;
    if end > data.len() {
        return Err(InstructionError::AccountDataTooSmall);
    }
    data[start..end].copy_from_slice(bytes);
    Ok(())
}

fn set_authority(ctx: &InvokeContext<'_>, checked: bool) -> Result<(), InstructionError> {
    let instruction_context = ctx.transaction_context.get_current_instruction_context()?;
    let mut account = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 0), true)?;
    let current_authority = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 1), false)?;
    let new_authority_key = if instruction_context.get_number_of_instruction_accounts() > 2 {
        let new_authority = ctx
            .transaction_context
            .try_borrow_account(&instruction_context, ix(&instruction_context, 2), false)?;
        if checked && !new_authority.is_signer() {
            return Err(InstructionError::MissingRequiredSignature);
        }
        Some(*new_authority.key())
    } else {
        if checked {
            return Err(InstructionError::NotEnoughAccountKeys);
        }
        None
    };

    let state = account_state(&account)?;
    let current_authority_key = match &state {
        UpgradeableLoaderState::Buffer { authority_address } => *authority_address,
        UpgradeableLoaderState::ProgramData { upgrade_authority_address, .. } => {
            *upgrade_authority_address
        }
        _ => return Err(InstructionError::InvalidAccountData),
    };
    let current_authority_key = current_authority_key.ok_or(InstructionError::Immutable)?;
    if !current_authority.is_signer() {
        return Err(InstructionError::MissingRequiredSignature);
    }
    if *current_authority.key() != current_authority_key {
        return Err(InstructionError::IncorrectAuthority);
    }
    drop(current_authority);

    let new_state = match state {
        UpgradeableLoaderState::Buffer { .. } => {
            UpgradeableLoaderState::Buffer { authority_address: new_authority_key }
        }
        UpgradeableLoaderState::ProgramData { slot, .. } => UpgradeableLoaderState::ProgramData {
            slot,
            upgrade_authority_address: new_authority_key,
        },
        _ => unreachable!("validated above"),
    };
    let data = account.get_data_mut()?;
    new_state.serialize_into(data).map_err(|_| InstructionError::AccountDataTooSmall)
}

fn close(ctx: &InvokeContext<'_>) -> Result<(), InstructionError> {
    let instruction_context = ctx.transaction_context.get_current_instruction_context()?;
    let mut closing = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 0), true)?;
    let mut recipient = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 1), true)?;
    let authority = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 2), false)?;

    let state = account_state(&closing)?;
    let authority_key = match &state {
        UpgradeableLoaderState::Uninitialized => return Err(InstructionError::InvalidAccountData),
        UpgradeableLoaderState::Buffer { authority_address } => *authority_address,
        UpgradeableLoaderState::ProgramData { slot, upgrade_authority_address } => {
            let clock = ctx
                .sysvar_cache
                .get_clock()
                .map_err(|_| InstructionError::UnsupportedSysvar)?;
            if clock.slot == *slot {
                return Err(InstructionError::InvalidArgument);
            }
            if instruction_context.get_number_of_instruction_accounts() < 4 {
                return Err(InstructionError::NotEnoughAccountKeys);
            }
            let program = ctx
                .transaction_context
                .try_borrow_account(&instruction_context, ix(&instruction_context, 3), true)?;
            match account_state(&program)? {
                UpgradeableLoaderState::Program { programdata_address }
                    if programdata_address == *closing.key() => {}
                _ => return Err(InstructionError::InvalidArgument),
            }
            *upgrade_authority_address
        }
        UpgradeableLoaderState::Program { .. } => return Err(InstructionError::InvalidArgument),
    };
    let authority_key = authority_key.ok_or(InstructionError::Immutable)?;
    if !authority.is_signer() || *authority.key() != authority_key {
        return Err(InstructionError::MissingRequiredSignature);
    }
    drop(authority);

    let lamports = closing.lamports();
    recipient.set_lamports(recipient.lamports().saturating_add(lamports))?;
    closing.set_lamports(0)?;
    let len = closing.data().len();
    closing.set_data_from_slice(&vec![0u8; len])?;
    Ok(())
}

fn deploy_with_max_data_len(ctx: &InvokeContext<'_>, max_data_len: u64) -> Result<(), InstructionError> {
    let instruction_context = ctx.transaction_context.get_current_instruction_context()?;
    let mut program = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 0), true)?;
    let mut programdata = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 1), true)?;
    let mut buffer = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 2), true)?;
    let authority = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 3), false)?;

    if account_state(&program)? != UpgradeableLoaderState::Uninitialized {
        return Err(InstructionError::AccountAlreadyInitialized);
    }
    let buffer_authority = match account_state(&buffer)? {
        UpgradeableLoaderState::Buffer { authority_address } => authority_address,
        _ => return Err(InstructionError::InvalidArgument),
    };
    if !authority.is_signer() {
        return Err(InstructionError::MissingRequiredSignature);
    }
    if buffer_authority != Some(*authority.key()) {
        return Err(InstructionError::IncorrectAuthority);
    }
    drop(authority);

    let programdata_len = UpgradeableLoaderState::PROGRAM_DATA_METADATA_SIZE
        .saturating_add(max_data_len as usize);
    if programdata.data().len() < programdata_len {
        return Err(InstructionError::AccountDataTooSmall);
    }
    let image = buffer.data()[UpgradeableLoaderState::BUFFER_METADATA_SIZE..].to_vec();
    if image.len() as u64 > max_data_len {
        return Err(InstructionError::AccountDataTooSmall);
    }

    let clock_slot = ctx
        .sysvar_cache
        .get_clock()
        .map_err(|_| InstructionError::UnsupportedSysvar)?
        .slot;
    let programdata_key = *programdata.key();

    let pd_state = UpgradeableLoaderState::ProgramData {
        slot: clock_slot,
        upgrade_authority_address: buffer_authority,
    };
    {
        let pd_data = programdata.get_data_mut()?;
        pd_state.serialize_into(pd_data).map_err(|_| InstructionError::AccountDataTooSmall)?;
        let start = UpgradeableLoaderState::PROGRAM_DATA_METADATA_SIZE;
        pd_data[start..start.saturating_add(image.len())].copy_from_slice(&image);
    }

    let program_state = UpgradeableLoaderState::Program { programdata_address: programdata_key };
    let program_data = program.get_data_mut()?;
    program_state
        .serialize_into(program_data)
        .map_err(|_| InstructionError::AccountDataTooSmall)?;
    program.set_executable(true)?;

    buffer.set_lamports(0)?;
    let buffer_len = buffer.data().len();
    buffer.set_data_from_slice(&vec![0u8; buffer_len])?;
    Ok(())
}

fn upgrade(ctx: &InvokeContext<'_>) -> Result<(), InstructionError> {
    let instruction_context = ctx.transaction_context.get_current_instruction_context()?;
    let mut programdata = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 0), true)?;
    let program = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 1), false)?;
    let mut buffer = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 2), true)?;
    let authority = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, ix(&instruction_context, 3), false)?;

    match account_state(&program)? {
        UpgradeableLoaderState::Program { programdata_address } if programdata_address == *programdata.key() => {}
        _ => return Err(InstructionError::InvalidArgument),
    }
    if !program.is_executable() {
        return Err(InstructionError::InvalidAccountData);
    }
    drop(program);

    let (current_slot, current_authority) = match account_state(&programdata)? {
        UpgradeableLoaderState::ProgramData { slot, upgrade_authority_address } => {
            (slot, upgrade_authority_address)
        }
        _ => return Err(InstructionError::InvalidAccountData),
    };
    let current_authority = current_authority.ok_or(InstructionError::Immutable)?;
    if !authority.is_signer() {
        return Err(InstructionError::MissingRequiredSignature);
    }
    if *authority.key() != current_authority {
        return Err(InstructionError::IncorrectAuthority);
    }
    drop(authority);

    let clock_slot = ctx
        .sysvar_cache
        .get_clock()
        .map_err(|_| InstructionError::UnsupportedSysvar)?
        .slot;
    if clock_slot == current_slot {
        return Err(InstructionError::InvalidArgument);
    }

    let image = buffer.data()[UpgradeableLoaderState::BUFFER_METADATA_SIZE..].to_vec();
    let available = programdata
        .data()
        .len()
        .saturating_sub(UpgradeableLoaderState::PROGRAM_DATA_METADATA_SIZE);
    if image.len() > available {
        return Err(InstructionError::AccountDataTooSmall);
    }

    let new_state = UpgradeableLoaderState::ProgramData {
        slot: clock_slot,
        upgrade_authority_address: Some(current_authority),
    };
    let pd_data = programdata.get_data_mut()?;
    pd_data.fill(0);
    new_state.serialize_into(pd_data).map_err(|_| InstructionError::AccountDataTooSmall)?;
    let start = UpgradeableLoaderState::PROGRAM_DATA_METADATA_SIZE;
    pd_data[start..start.saturating_add(image.len())].copy_from_slice(&image);

    buffer.set_lamports(0)?;
    let buffer_len = buffer.data().len();
    buffer.set_data_from_slice(&vec![0u8; buffer_len])?;
    Ok(())
}
