//! Fetch-decode-execute loop (spec.md §4.D). Grounded on the teacher's
//! `Interpreter` + the opcode table from
//! `examples/other_examples/2979daa9_nushell-nushell__crates-nu-ebpf-src-compiler-instruction.rs.rs`.
//! Twos-complement arithmetic throughout; division by zero, an
//! out-of-range shift amount, and an unrecognized opcode are all fatal,
//! per spec.md's explicit instruction-level invariants.

use {
    crate::{
        call_frame::CallFrame,
        context::ContextObject,
        error::EbpfError,
        opcode::*,
        vm::EbpfVm,
    },
    sbpf_loader::slot::{Slot, SLOT_SIZE},
};

fn reg64(value: u64, is_64: bool) -> u64 {
    if is_64 {
        value
    } else {
        value as u32 as u64
    }
}

/// Runs until `EXIT` unwinds the top-level frame, the instruction meter is
/// exhausted, or a fault is raised. Returns the total instruction count
/// and either the program's `r0` or the fault that ended it.
pub fn run<C: ContextObject>(vm: &mut EbpfVm<'_, C>) -> (u64, Result<u64, EbpfError>) {
    let mut insn_count: u64 = 0;
    loop {
        if vm.context_object.get_remaining() == 0 {
            return (insn_count, Err(EbpfError::ExceededMaxInstructions));
        }
        match step(vm) {
            Ok(Some(result)) => return (insn_count + 1, Ok(result)),
            Ok(None) => {
                insn_count += 1;
                vm.context_object.consume(1);
            }
            Err(e) => return (insn_count + 1, Err(e)),
        }
    }
}

/// Executes one logical instruction (two slots for `LD_DW_IMM`). `Ok(Some(r0))`
/// signals a top-level `EXIT`; `Ok(None)` means keep going.
fn step<C: ContextObject>(vm: &mut EbpfVm<'_, C>) -> Result<Option<u64>, EbpfError> {
    let text_start = vm.program.text_range.start;
    let slot_count = vm.program.text_slot_count();
    if vm.pc >= slot_count {
        return Err(EbpfError::AccessViolation(
            crate::error::AccessType::Read,
            text_start as u64 + vm.pc * SLOT_SIZE as u64,
            SLOT_SIZE as u64,
        ));
    }
    let off = text_start + (vm.pc as usize) * SLOT_SIZE;
    let slot = Slot::from_bytes(&vm.program.rodata[off..off + SLOT_SIZE]);
    let op = slot.op();
    let class = op & CLASS_MASK;
    let dst = slot.dst() as usize;
    let src = slot.src() as usize;
    let offset = slot.off() as i64;
    let imm = slot.imm();
    if dst >= vm.registers.len() || src >= vm.registers.len() {
        return Err(EbpfError::InvalidOpcode(op));
    }

    let trace_state = {
        let mut state = [0u64; 12];
        state[..11].copy_from_slice(&vm.registers);
        state[11] = vm.pc;
        state
    };
    vm.context_object.trace(trace_state);

    match class {
        BPF_LD if op == LD_DW_IMM => {
            if vm.pc + 1 >= slot_count {
                return Err(EbpfError::InvalidOpcode(op));
            }
            let next_off = text_start + ((vm.pc + 1) as usize) * SLOT_SIZE;
            let next = Slot::from_bytes(&vm.program.rodata[next_off..next_off + SLOT_SIZE]);
            let value = (imm as u32 as u64) | ((next.imm() as u32 as u64) << 32);
            vm.registers[dst] = value;
            vm.pc += 2;
            Ok(None)
        }
        BPF_LD => Err(EbpfError::InvalidOpcode(op)),

        BPF_LDX => {
            if op & MODE_MASK != BPF_MEM {
                return Err(EbpfError::InvalidOpcode(op));
            }
            let addr = (vm.registers[src] as i64).wrapping_add(offset) as u64;
            let size = op & SIZE_MASK;
            let value = match size {
                BPF_B => vm.memory_mapping.load::<1>(addr)?[0] as u64,
                BPF_H => u16::from_le_bytes(vm.memory_mapping.load::<2>(addr)?) as u64,
                BPF_W => u32::from_le_bytes(vm.memory_mapping.load::<4>(addr)?) as u64,
                BPF_DW => u64::from_le_bytes(vm.memory_mapping.load::<8>(addr)?),
                _ => return Err(EbpfError::InvalidOpcode(op)),
            };
            vm.registers[dst] = value;
            vm.pc += 1;
            Ok(None)
        }

        BPF_ST | BPF_STX => {
            if op & MODE_MASK != BPF_MEM {
                return Err(EbpfError::InvalidOpcode(op));
            }
            let addr = (vm.registers[dst] as i64).wrapping_add(offset) as u64;
            let value = if class == BPF_ST {
                imm as i64 as u64
            } else {
                vm.registers[src]
            };
            let size = op & SIZE_MASK;
            match size {
                BPF_B => vm.memory_mapping.store(addr, &(value as u8).to_le_bytes())?,
                BPF_H => vm.memory_mapping.store(addr, &(value as u16).to_le_bytes())?,
                BPF_W => vm.memory_mapping.store(addr, &(value as u32).to_le_bytes())?,
                BPF_DW => vm.memory_mapping.store(addr, &value.to_le_bytes())?,
                _ => return Err(EbpfError::InvalidOpcode(op)),
            }
            vm.pc += 1;
            Ok(None)
        }

        BPF_ALU | BPF_ALU64 => {
            let is_64 = class == BPF_ALU64;
            let alu_op = op & ALU_OP_MASK;
            let src_val = if op & SRC_MASK == BPF_X {
                reg64(vm.registers[src], is_64)
            } else {
                reg64(imm as i64 as u64, is_64)
            };
            let dst_val = reg64(vm.registers[dst], is_64);
            let width = if is_64 { 64 } else { 32 };
            let result = match alu_op {
                BPF_ADD => dst_val.wrapping_add(src_val),
                BPF_SUB => dst_val.wrapping_sub(src_val),
                BPF_MUL => dst_val.wrapping_mul(src_val),
                BPF_DIV => {
                    if src_val == 0 {
                        return Err(EbpfError::DivideByZero);
                    }
                    dst_val.wrapping_div(src_val)
                }
                BPF_MOD => {
                    if src_val == 0 {
                        return Err(EbpfError::DivideByZero);
                    }
                    dst_val.wrapping_rem(src_val)
                }
                BPF_OR => dst_val | src_val,
                BPF_AND => dst_val & src_val,
                BPF_XOR => dst_val ^ src_val,
                BPF_MOV => src_val,
                BPF_LSH => {
                    if src_val >= width {
                        return Err(EbpfError::InvalidOpcode(op));
                    }
                    dst_val.wrapping_shl(src_val as u32)
                }
                BPF_RSH => {
                    if src_val >= width {
                        return Err(EbpfError::InvalidOpcode(op));
                    }
                    dst_val.wrapping_shr(src_val as u32)
                }
                BPF_ARSH => {
                    if src_val >= width {
                        return Err(EbpfError::InvalidOpcode(op));
                    }
                    if is_64 {
                        ((dst_val as i64) >> src_val) as u64
                    } else {
                        (((dst_val as u32) as i32) >> src_val) as u32 as u64
                    }
                }
                BPF_NEG => {
                    if is_64 {
                        (dst_val as i64).wrapping_neg() as u64
                    } else {
                        (dst_val as u32 as i32).wrapping_neg() as u32 as u64
                    }
                }
                _ => return Err(EbpfError::InvalidOpcode(op)),
            };
            vm.registers[dst] = reg64(result, is_64);
            vm.pc += 1;
            Ok(None)
        }

        BPF_JMP | BPF_JMP32 => {
            if op == CALL {
                return do_call(vm, imm);
            }
            if op == EXIT {
                return do_exit(vm);
            }
            let is_64 = class == BPF_JMP;
            let jmp_op = op & ALU_OP_MASK;
            if jmp_op == BPF_JA {
                vm.pc = (vm.pc as i64 + 1 + offset) as u64;
                return Ok(None);
            }
            let src_val = if op & SRC_MASK == BPF_X {
                reg64(vm.registers[src], is_64)
            } else {
                reg64(imm as i64 as u64, is_64)
            };
            let dst_val = reg64(vm.registers[dst], is_64);
            let (d_s, s_s) = if is_64 {
                (dst_val as i64, src_val as i64)
            } else {
                (dst_val as u32 as i32 as i64, src_val as u32 as i32 as i64)
            };
            let taken = match jmp_op {
                BPF_JEQ => dst_val == src_val,
                BPF_JNE => dst_val != src_val,
                BPF_JGT => dst_val > src_val,
                BPF_JGE => dst_val >= src_val,
                BPF_JLT => dst_val < src_val,
                BPF_JLE => dst_val <= src_val,
                BPF_JSET => dst_val & src_val != 0,
                BPF_JSGT => d_s > s_s,
                BPF_JSGE => d_s >= s_s,
                BPF_JSLT => d_s < s_s,
                BPF_JSLE => d_s <= s_s,
                _ => return Err(EbpfError::InvalidOpcode(op)),
            };
            vm.pc = if taken {
                (vm.pc as i64 + 1 + offset) as u64
            } else {
                vm.pc + 1
            };
            Ok(None)
        }

        _ => Err(EbpfError::InvalidOpcode(op)),
    }
}

fn do_call<C: ContextObject>(vm: &mut EbpfVm<'_, C>, imm: i32) -> Result<Option<u64>, EbpfError> {
    let hash = imm as u32;
    if let Some(&target) = vm.program.function_table.get(&hash) {
        if vm.call_depth >= vm.config.max_call_depth {
            return Err(EbpfError::StackOverflow);
        }
        vm.call_frames[vm.call_depth] = CallFrame {
            saved_registers: [vm.registers[6], vm.registers[7], vm.registers[8], vm.registers[9]],
            frame_pointer: vm.registers[10],
            return_pc: vm.pc + 1,
        };
        vm.call_depth += 1;
        vm.registers[10] = vm.registers[10].saturating_sub(vm.config.stack_frame_size as u64);
        vm.pc = target;
        Ok(None)
    } else if let Some(function) = vm.syscalls.lookup(hash) {
        let args = (
            vm.registers[1],
            vm.registers[2],
            vm.registers[3],
            vm.registers[4],
            vm.registers[5],
        );
        let result = function(
            vm.context_object,
            args.0,
            args.1,
            args.2,
            args.3,
            args.4,
            &mut vm.memory_mapping,
        )?;
        vm.registers[0] = result;
        vm.pc += 1;
        Ok(None)
    } else {
        Err(EbpfError::UnresolvedFunction(hash))
    }
}

fn do_exit<C: ContextObject>(vm: &mut EbpfVm<'_, C>) -> Result<Option<u64>, EbpfError> {
    if vm.call_depth == 0 {
        return Ok(Some(vm.registers[0]));
    }
    vm.call_depth -= 1;
    let frame = vm.call_frames[vm.call_depth];
    vm.registers[6] = frame.saved_registers[0];
    vm.registers[7] = frame.saved_registers[1];
    vm.registers[8] = frame.saved_registers[2];
    vm.registers[9] = frame.saved_registers[3];
    vm.registers[10] = frame.frame_pointer;
    vm.pc = frame.return_pc;
    Ok(None)
}
