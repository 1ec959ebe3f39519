//! Cross-program invocation (spec.md §4.E "Cross-program invocation"):
//! translates the guest's `SolInstruction`/`SolAccountMeta`/`SolAccountInfo`
//! triple into a native [`Instruction`] plus the set of PDA signers the
//! caller authorized via seeds, then recurses through
//! [`crate::invoke_context::Dispatcher`].

use {
    super::charge,
    crate::invoke_context::InvokeContext,
    replay_sdk::{
        instruction::{SOL_ACCOUNT_INFO_SIZE, SOL_ACCOUNT_META_SIZE, SOL_INSTRUCTION_STRUCT_SIZE},
        AccountMeta, Instruction, Pubkey,
    },
    sbpf_vm::{memory::MemoryMapping, EbpfError},
};

fn read_instruction(
    memory_mapping: &MemoryMapping,
    instruction_addr: u64,
) -> Result<Instruction, EbpfError> {
    let header = memory_mapping.load::<SOL_INSTRUCTION_STRUCT_SIZE>(instruction_addr)?;
    let program_id_addr = u64::from_le_bytes(header[0..8].try_into().unwrap());
    let accounts_addr = u64::from_le_bytes(header[8..16].try_into().unwrap());
    let accounts_len = u64::from_le_bytes(header[16..24].try_into().unwrap());
    let data_addr = u64::from_le_bytes(header[24..32].try_into().unwrap());
    let data_len = u64::from_le_bytes(header[32..40].try_into().unwrap());

    let program_id_bytes: [u8; 32] = memory_mapping.load(program_id_addr)?;
    let program_id = Pubkey::new_from_array(program_id_bytes);

    let mut accounts = Vec::with_capacity(accounts_len as usize);
    for i in 0..accounts_len {
        let meta_addr = accounts_addr.saturating_add(i.saturating_mul(SOL_ACCOUNT_META_SIZE as u64));
        let meta = memory_mapping.load::<SOL_ACCOUNT_META_SIZE>(meta_addr)?;
        let pubkey_addr = u64::from_le_bytes(meta[0..8].try_into().unwrap());
        let is_signer = meta[8] != 0;
        let is_writable = meta[9] != 0;
        let pubkey_bytes: [u8; 32] = memory_mapping.load(pubkey_addr)?;
        accounts.push(AccountMeta {
            pubkey: Pubkey::new_from_array(pubkey_bytes),
            is_signer,
            is_writable,
        });
    }

    let data = memory_mapping.translate(data_addr, data_len)?.to_vec();
    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}

/// `SolAccountInfo`'s on-wire layout (`original_source/pkg/sealevel/
/// types.go`): six 8-byte fields (`KeyAddr, LamportsAddr, DataLen, DataAddr,
/// OwnerAddr, RentEpoch`) followed by three 1-byte bools, 51 bytes total.
struct AccountInfoEntry {
    key_addr: u64,
    lamports_addr: u64,
    data_len_addr: u64,
    data_addr: u64,
    owner_addr: u64,
}

fn read_account_info_entry(memory_mapping: &MemoryMapping, entry_addr: u64) -> Result<AccountInfoEntry, EbpfError> {
    let header = memory_mapping.load::<SOL_ACCOUNT_INFO_SIZE>(entry_addr)?;
    Ok(AccountInfoEntry {
        key_addr: u64::from_le_bytes(header[0..8].try_into().unwrap()),
        lamports_addr: u64::from_le_bytes(header[8..16].try_into().unwrap()),
        data_len_addr: entry_addr.saturating_add(16),
        data_addr: u64::from_le_bytes(header[24..32].try_into().unwrap()),
        owner_addr: u64::from_le_bytes(header[32..40].try_into().unwrap()),
    })
}

/// Writes each account's post-call lamports/owner/data back into the guest's
/// `AccountInfo` array, the CPI-time mirror of `bpf_executor::
/// deserialize_output`'s entry-time copy-back. Without this a caller that
/// reads its own account state right after a successful CPI would see
/// pre-call bytes.
fn writeback_account_infos(
    ctx: &InvokeContext<'_>,
    account_infos_addr: u64,
    account_infos_len: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<(), EbpfError> {
    let instruction_context = ctx
        .transaction_context
        .get_current_instruction_context()
        .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    let program_count = instruction_context.get_number_of_program_accounts();

    for i in 0..account_infos_len {
        let entry_addr = account_infos_addr.saturating_add(i.saturating_mul(SOL_ACCOUNT_INFO_SIZE as u64));
        let entry = read_account_info_entry(memory_mapping, entry_addr)?;
        let key_bytes: [u8; 32] = memory_mapping.load(entry.key_addr)?;
        let key = Pubkey::new_from_array(key_bytes);

        let Some(index_in_transaction) = ctx.transaction_context.find_index_of_account(&key) else {
            continue;
        };
        let position = instruction_context
            .program_accounts()
            .iter()
            .chain(instruction_context.instruction_accounts().iter().map(|a| &a.index_in_transaction))
            .position(|&idx| idx == index_in_transaction);
        let Some(pos) = position else { continue };
        if (pos as u16) < program_count {
            continue;
        }

        let account = ctx
            .transaction_context
            .try_borrow_account(&instruction_context, pos as u16, false)
            .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;

        memory_mapping.store(entry.lamports_addr, &account.lamports().to_le_bytes())?;
        memory_mapping.store(entry.owner_addr, &account.owner().to_bytes())?;
        memory_mapping.store(entry.data_addr, account.data())?;
        memory_mapping.store(entry.data_len_addr, &(account.data().len() as u64).to_le_bytes())?;
    }
    Ok(())
}

/// Reads the caller's `signers_seeds` array (an array of seed-descriptor
/// arrays) and derives the PDA each one authorizes, per spec.md §4.E
/// "Cross program invocation": seeds accompanying the call stand in for a
/// signature the guest program cannot otherwise produce.
fn read_signer_seeds(
    memory_mapping: &MemoryMapping,
    signers_seeds_addr: u64,
    signers_seeds_count: u64,
    caller_program_id: &Pubkey,
) -> Result<Vec<Pubkey>, EbpfError> {
    let mut signers = Vec::with_capacity(signers_seeds_count as usize);
    for i in 0..signers_seeds_count {
        // Each entry is itself a (addr, len) descriptor over an array of
        // (addr, len) seed descriptors.
        let entry_addr = signers_seeds_addr.saturating_add(i.saturating_mul(16));
        let entry = memory_mapping.load::<16>(entry_addr)?;
        let seeds_addr = u64::from_le_bytes(entry[0..8].try_into().unwrap());
        let seeds_count = u64::from_le_bytes(entry[8..16].try_into().unwrap());
        let seeds = super::read_descriptor_vals(memory_mapping, seeds_addr, seeds_count)?;
        let seed_refs: Vec<&[u8]> = seeds.iter().map(|s| s.as_slice()).collect();
        let pda = Pubkey::create_program_address(&seed_refs, caller_program_id)
            .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
        signers.push(pda);
    }
    Ok(signers)
}

pub fn sol_invoke_signed_c(
    ctx: &mut InvokeContext<'_>,
    instruction_addr: u64,
    account_infos_addr: u64,
    account_infos_len: u64,
    signers_seeds_addr: u64,
    signers_seeds_count: u64,
    memory_mapping: &mut MemoryMapping,
) -> Result<u64, EbpfError> {
    charge(ctx, ctx.compute_budget.invoke_units)?;

    let instruction = read_instruction(memory_mapping, instruction_addr)?;

    let instruction_context = ctx
        .transaction_context
        .get_current_instruction_context()
        .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    let caller_index = instruction_context
        .get_last_program_account_index()
        .map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    let caller_program_id = *ctx.transaction_context.get_key_of_account_at_index(caller_index);
    drop(instruction_context);

    let extra_signers = read_signer_seeds(
        memory_mapping,
        signers_seeds_addr,
        signers_seeds_count,
        &caller_program_id,
    )?;

    // The dispatcher re-resolves each account by key against the transaction
    // context rather than trusting the guest's `AccountInfo` pointers, so
    // `account_infos_addr` isn't read going in — only coming back out, to
    // copy the callee's mutations into the caller's view of any account they
    // share (mirroring `bpf_executor::deserialize_output`'s entry-time copy).
    let dispatch = ctx
        .dispatch
        .ok_or_else(|| EbpfError::CpiFailed("no CPI dispatcher configured".to_string()))?;
    dispatch(ctx, instruction, &extra_signers).map_err(|e| EbpfError::CpiFailed(e.to_string()))?;
    writeback_account_infos(ctx, account_infos_addr, account_infos_len, memory_mapping)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_header_size_matches_wire_layout() {
        assert_eq!(SOL_INSTRUCTION_STRUCT_SIZE, 40);
        assert_eq!(SOL_ACCOUNT_META_SIZE, 10);
    }
}
