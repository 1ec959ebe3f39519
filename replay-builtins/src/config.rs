//! Config program (spec.md §4.I, "native handlers for loader/config/system").
//! Grounded verbatim on `original_source/pkg/sealevel/config_program.go`'s
//! `ConfigProgramExecute`: the algorithm below mirrors it step for step,
//! including its two `checkMaxLen` cases and the `counter`-indexed signer
//! walk.

use {
    replay_program_runtime::InvokeContext,
    replay_sdk::{instruction_error::InstructionError, Pubkey},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ConfigKey {
    pubkey: Pubkey,
    is_signer: bool,
}

/// Solana's "compact-u16": 1-3 bytes, 7 payload bits per byte, high bit set
/// on every byte but the last.
fn read_compact_u16(data: &[u8], pos: &mut usize) -> Result<u16, InstructionError> {
    let mut result: u32 = 0;
    for shift in [0u32, 7, 14] {
        let byte = *data.get(*pos).ok_or(InstructionError::InvalidInstructionData)?;
        *pos = pos.saturating_add(1);
        result |= ((byte & 0x7f) as u32) << shift;
        if byte & 0x80 == 0 {
            return u16::try_from(result).map_err(|_| InstructionError::InvalidInstructionData);
        }
    }
    Err(InstructionError::InvalidInstructionData)
}

fn unmarshal_config_keys(data: &[u8], check_max_len: bool) -> Result<Vec<ConfigKey>, InstructionError> {
    let mut pos = 0usize;
    let num_keys = read_compact_u16(data, &mut pos)?;
    let mut keys = Vec::with_capacity(num_keys as usize);
    for _ in 0..num_keys {
        let end = pos.saturating_add(32);
        let bytes = data.get(pos..end).ok_or(InstructionError::InvalidInstructionData)?;
        let pubkey = Pubkey::try_from(bytes).map_err(|_| InstructionError::InvalidInstructionData)?;
        pos = end;
        let is_signer_byte = *data.get(pos).ok_or(InstructionError::InvalidInstructionData)?;
        pos = pos.saturating_add(1);
        let is_signer = match is_signer_byte {
            0 => false,
            1 => true,
            _ => return Err(InstructionError::InvalidInstructionData),
        };
        keys.push(ConfigKey { pubkey, is_signer });
    }
    if check_max_len && pos > 1232 {
        return Err(InstructionError::InvalidInstructionData);
    }
    Ok(keys)
}

fn signer_only(keys: &[ConfigKey]) -> Vec<ConfigKey> {
    keys.iter().copied().filter(|k| k.is_signer).collect()
}

fn dedup_by_pubkey(keys: &[ConfigKey]) -> Vec<ConfigKey> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for key in keys {
        if !seen.contains(&key.pubkey) {
            seen.push(key.pubkey);
            out.push(*key);
        }
    }
    out
}

pub fn process_instruction(ctx: &InvokeContext<'_>) -> Result<(), InstructionError> {
    ctx.transaction_context
        .consume_compute_units(ctx.compute_budget.config_program_default_units)?;

    let instruction_context = ctx.transaction_context.get_current_instruction_context()?;
    let instr_data = instruction_context.get_instruction_data().to_vec();
    let new_config_keys = unmarshal_config_keys(&instr_data, true)?;

    let program_count = instruction_context.get_number_of_program_accounts();
    let mut config_account = ctx
        .transaction_context
        .try_borrow_account(&instruction_context, program_count, true)?;
    let config_account_key = *config_account.key();

    if config_account.owner() != super::ids::config_program_id() {
        return Err(InstructionError::InvalidAccountOwner);
    }

    let current_config_keys = unmarshal_config_keys(config_account.data(), false)
        .map_err(|_| InstructionError::InvalidAccountData)?;
    let current_signer_keys = signer_only(&current_config_keys);
    if current_signer_keys.is_empty() && !config_account.is_signer() {
        return Err(InstructionError::MissingRequiredSignature);
    }

    let new_signer_keys = signer_only(&new_config_keys);
    let mut counter: IndexOfAccountCounter = 0;
    for signer_key in &new_signer_keys {
        counter = counter.saturating_add(1);
        if signer_key.pubkey != config_account_key {
            let signer_account = ctx
                .transaction_context
                .try_borrow_account(
                    &instruction_context,
                    program_count.saturating_add(counter),
                    false,
                )
                .map_err(|_| InstructionError::MissingRequiredSignature)?;
            if !signer_account.is_signer() {
                return Err(InstructionError::MissingRequiredSignature);
            }
            if signer_key.pubkey != *signer_account.key() {
                return Err(InstructionError::MissingRequiredSignature);
            }
            if !current_config_keys.is_empty()
                && !current_signer_keys.iter().any(|s| s.pubkey == signer_key.pubkey)
            {
                return Err(InstructionError::MissingRequiredSignature);
            }
        } else if !config_account.is_signer() {
            return Err(InstructionError::MissingRequiredSignature);
        }
    }

    if new_config_keys.len() != dedup_by_pubkey(&new_config_keys).len() {
        return Err(InstructionError::InvalidArgument);
    }
    if current_signer_keys.len() as u64 > counter {
        return Err(InstructionError::MissingRequiredSignature);
    }
    if config_account.data().len() < instr_data.len() {
        return Err(InstructionError::InvalidInstructionData);
    }
    config_account.set_data_from_slice(&instr_data)
}

type IndexOfAccountCounter = replay_transaction_context::IndexOfAccount;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_u16_round_trips_small_values() {
        let mut pos = 0;
        assert_eq!(read_compact_u16(&[0x00], &mut pos).unwrap(), 0);
        pos = 0;
        assert_eq!(read_compact_u16(&[0x01], &mut pos).unwrap(), 1);
        pos = 0;
        assert_eq!(read_compact_u16(&[0x80, 0x01], &mut pos).unwrap(), 128);
    }

    #[test]
    fn unmarshal_rejects_truncated_keys() {
        assert!(unmarshal_config_keys(&[0x01], false).is_err());
    }
}
