//! Top-level `Program = Builtin | BPF` sum and instruction dispatch
//! (spec.md §9 Design Notes, §4.E "Cross program invocation"). This is the
//! piece that ties `sbpf-loader`/`sbpf-vm` (bytecode) and `replay-program-
//! runtime` (`InvokeContext`, syscalls) to the three native programs in this
//! crate, and constructs the `Dispatcher` closure CPI syscalls call back
//! into. Grounded on the teacher's `solana-bpf-loader-program`, which is the
//! analogous crate owning this orchestration in the real runtime (its
//! `Cargo.toml` depends on `solana-program-runtime`/`solana-sbpf`, never the
//! reverse).

use {
    crate::{bpf_executor, bpf_loader, config, ids, system},
    replay_program_runtime::InvokeContext,
    replay_sdk::{instruction_error::InstructionError, Instruction, Pubkey},
    replay_transaction_context::InstructionAccount,
    sbpf_loader::LoadedProgram,
    std::collections::HashMap,
};

type BuiltinHandler = fn(&InvokeContext<'_>) -> Result<(), InstructionError>;

/// A resolved, invokable program (spec.md §9: "Program = Builtin | BPF").
pub enum Program {
    Builtin(BuiltinHandler),
    Bpf(LoadedProgram),
}

/// Maps program ids to their resolved `Program`, populated once with the
/// three native programs and lazily with every BPF program a replayed
/// transaction touches.
pub struct ProgramCache {
    programs: HashMap<Pubkey, Program>,
}

impl Default for ProgramCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramCache {
    pub fn new() -> Self {
        let mut programs = HashMap::new();
        programs.insert(
            ids::bpf_loader_upgradeable_id(),
            Program::Builtin(bpf_loader::processor::process_instruction),
        );
        programs.insert(ids::config_program_id(), Program::Builtin(config::process_instruction));
        programs.insert(ids::system_program_id(), Program::Builtin(system::process_instruction));
        Self { programs }
    }

    /// Links `elf` and registers it under `program_id`, overwriting any
    /// previous entry (spec.md §4.I `Upgrade`: the next invocation must see
    /// the new bytecode).
    pub fn load_bpf(&mut self, program_id: Pubkey, elf: Vec<u8>) -> Result<(), sbpf_loader::ElfError> {
        let registry = replay_program_runtime::create_registry::<'static>();
        let loaded = sbpf_loader::load(elf, &registry, false)?;
        self.programs.insert(program_id, Program::Bpf(loaded));
        Ok(())
    }

    pub fn get(&self, program_id: &Pubkey) -> Option<&Program> {
        self.programs.get(program_id)
    }
}

fn resolve_instruction_accounts(
    ctx: &InvokeContext<'_>,
    instruction: &Instruction,
) -> Result<(u16, Vec<InstructionAccount>), InstructionError> {
    let program_index = ctx
        .transaction_context
        .find_index_of_account(&instruction.program_id)
        .ok_or(InstructionError::IncorrectProgramId)?;
    let instruction_accounts = instruction
        .accounts
        .iter()
        .map(|meta| {
            let index_in_transaction = ctx
                .transaction_context
                .find_index_of_account(&meta.pubkey)
                .ok_or(InstructionError::NotEnoughAccountKeys)?;
            Ok(InstructionAccount {
                index_in_transaction,
                index_in_caller: index_in_transaction,
                index_in_callee: index_in_transaction,
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
            })
        })
        .collect::<Result<Vec<_>, InstructionError>>()?;
    Ok((program_index, instruction_accounts))
}

/// Borrows every account the current instruction context names and copies
/// them into the executor's view, running `program` and writing mutations
/// back (spec.md §4.H, §4.C). Requires `&mut InvokeContext` because driving
/// an `EbpfVm` needs mutable access to the context object's trace log and
/// heap allocator — only the top-level driver below holds that; see
/// `make_dispatcher`'s doc comment for why nested CPI targets BPF programs
/// are out of scope.
fn run_bpf(ctx: &mut InvokeContext<'_>, program: &LoadedProgram, program_id: &Pubkey) -> Result<(), InstructionError> {
    let instruction_context = ctx.transaction_context.get_current_instruction_context()?;
    let instruction_data = instruction_context.get_instruction_data().to_vec();
    let program_count = instruction_context.get_number_of_program_accounts();
    let total = instruction_context.get_number_of_accounts();

    let mut borrows = Vec::new();
    for idx in 0..total {
        let write = idx >= program_count
            && instruction_context
                .is_instruction_account_writable(idx.saturating_sub(program_count))
                .unwrap_or(false);
        borrows.push(ctx.transaction_context.try_borrow_account(&instruction_context, idx, write)?);
    }
    drop(instruction_context);

    let mut owned_data: Vec<Vec<u8>> = borrows.iter().map(|a| a.data().to_vec()).collect();
    let mut accounts: Vec<bpf_executor::ExecutorAccount<'_>> = borrows
        .iter()
        .zip(owned_data.iter_mut())
        .map(|(account, data)| bpf_executor::ExecutorAccount {
            key: account.key().to_bytes(),
            owner: account.owner().to_bytes(),
            lamports: account.lamports(),
            data,
            is_signer: account.is_signer(),
            is_writable: account.is_writable(),
            is_executable: account.is_executable(),
        })
        .collect();

    let result = bpf_executor::execute(ctx, program, &program_id.to_bytes(), &mut accounts, &instruction_data);
    drop(accounts);

    for (account, data) in borrows.iter_mut().zip(owned_data.into_iter()) {
        if account.is_writable() && account.data() != data.as_slice() {
            account.set_data_from_slice(&data)?;
        }
    }
    result.map(|_| ())
}

/// Drives a single top-level instruction from nothing on the stack: pushes
/// its context, runs it, pops with success/failure recorded (spec.md §3:
/// failed instructions roll back to their push-time snapshot).
pub fn process_top_level_instruction(
    ctx: &mut InvokeContext<'_>,
    cache: &ProgramCache,
    instruction: &Instruction,
) -> Result<(), InstructionError> {
    let (program_index, instruction_accounts) = resolve_instruction_accounts(ctx, instruction)?;
    ctx.transaction_context
        .push(vec![program_index], instruction_accounts, instruction.data.clone())?;

    let result = match cache.get(&instruction.program_id).ok_or(InstructionError::IncorrectProgramId) {
        Ok(Program::Builtin(handler)) => handler(ctx),
        Ok(Program::Bpf(program)) => {
            let program_id = instruction.program_id;
            run_bpf(ctx, program, &program_id)
        }
        Err(e) => Err(e),
    };
    ctx.transaction_context.pop(result.is_ok())?;
    result
}

/// Builds the closure handed to `InvokeContext::with_dispatcher`
/// (spec.md §4.E): a CPI call pushes a new instruction context whose signer
/// flags are only trusted for accounts the *immediate caller* already held
/// as a signer, or that match one of the invoking program's derived-address
/// `extra_signers` — callees can never gain privileges the caller lacked.
///
/// Only builtin targets are runnable through this path: the `Dispatcher`
/// type (fixed by `replay-program-runtime`) hands syscalls a shared
/// `&InvokeContext`, but executing a nested `EbpfVm` needs `&mut
/// InvokeContext` for its trace log and heap allocator. spec.md §8's CPI-
/// relevant scenarios never nest BPF-to-BPF, so a BPF-owned CPI target
/// here fails closed rather than reaching for `unsafe` to manufacture a
/// second mutable view.
pub fn make_dispatcher<'a>(
    cache: &'a ProgramCache,
) -> impl Fn(&InvokeContext<'a>, Instruction, &[Pubkey]) -> Result<(), InstructionError> + 'a {
    move |ctx: &InvokeContext<'a>, instruction: Instruction, extra_signers: &[Pubkey]| {
        let caller = ctx.transaction_context.get_current_instruction_context()?;
        let caller_program_count = caller.get_number_of_program_accounts();
        let (program_index, mut instruction_accounts) = resolve_instruction_accounts(ctx, &instruction)?;

        for (meta, account) in instruction.accounts.iter().zip(instruction_accounts.iter_mut()) {
            let position = caller
                .program_accounts()
                .iter()
                .chain(caller.instruction_accounts().iter().map(|a| &a.index_in_transaction))
                .position(|&idx| idx == account.index_in_transaction);
            let caller_is_signer = position
                .map(|pos| {
                    if pos < caller_program_count as usize {
                        false
                    } else {
                        caller
                            .is_instruction_account_signer((pos as u16).saturating_sub(caller_program_count))
                            .unwrap_or(false)
                    }
                })
                .unwrap_or(false);
            let caller_is_writable = position
                .map(|pos| {
                    if pos < caller_program_count as usize {
                        false
                    } else {
                        caller
                            .is_instruction_account_writable((pos as u16).saturating_sub(caller_program_count))
                            .unwrap_or(false)
                    }
                })
                .unwrap_or(false);
            account.is_signer = meta.is_signer && (caller_is_signer || extra_signers.contains(&meta.pubkey));
            account.is_writable = meta.is_writable && caller_is_writable;
        }
        drop(caller);

        let program = cache.get(&instruction.program_id).ok_or(InstructionError::IncorrectProgramId)?;
        let handler = match program {
            Program::Builtin(handler) => *handler,
            Program::Bpf(_) => return Err(InstructionError::IncorrectProgramId),
        };

        ctx.transaction_context
            .push(vec![program_index], instruction_accounts, instruction.data)?;
        let result = handler(ctx);
        ctx.transaction_context.pop(result.is_ok())?;
        result
    }
}
