//! Fixed-format log lines emitted at well-known points in the invocation
//! lifecycle, matching the teacher's `stable_log` module (the exact text is
//! part of the consensus-visible program output, hence "stable").

use {
    crate::log_collector::LogCollector,
    replay_sdk::Pubkey,
    std::{cell::RefCell, rc::Rc},
};

fn emit(log_collector: &Option<Rc<RefCell<LogCollector>>>, message: impl Fn() -> String) {
    if let Some(log_collector) = log_collector {
        log_collector.borrow_mut().log(&message());
    }
}

pub fn program_invoke(
    log_collector: &Option<Rc<RefCell<LogCollector>>>,
    program_id: &Pubkey,
    invoke_depth: usize,
) {
    emit(log_collector, || {
        format!("Program {program_id} invoke [{invoke_depth}]")
    });
}

pub fn program_log(log_collector: &Option<Rc<RefCell<LogCollector>>>, message: &str) {
    emit(log_collector, || format!("Program log: {message}"));
}

pub fn program_data(log_collector: &Option<Rc<RefCell<LogCollector>>>, data: &[&[u8]]) {
    emit(log_collector, || {
        let encoded: Vec<String> = data.iter().map(|d| bs58_encode(d)).collect();
        format!("Program data: {}", encoded.join(" "))
    });
}

pub fn program_success(log_collector: &Option<Rc<RefCell<LogCollector>>>, program_id: &Pubkey) {
    emit(log_collector, || format!("Program {program_id} success"));
}

pub fn program_failure(
    log_collector: &Option<Rc<RefCell<LogCollector>>>,
    program_id: &Pubkey,
    err: &dyn std::fmt::Display,
) {
    emit(log_collector, || {
        format!("Program {program_id} failed: {err}")
    });
}

fn bs58_encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}
