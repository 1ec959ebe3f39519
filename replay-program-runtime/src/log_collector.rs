//! The program-facing log sink (spec.md §1 ambient stack): a byte-capped
//! ring of `Program log:`-style lines, shared via `Rc<RefCell<_>>` between
//! the host and every syscall that writes to it, matching the teacher's
//! `solana-log-collector` crate.

use std::{cell::RefCell, rc::Rc};

const DEFAULT_LOG_MESSAGES_BYTES_LIMIT: usize = 10_000;

pub struct LogCollector {
    messages: Vec<String>,
    bytes_written: usize,
    bytes_limit: Option<usize>,
    limit_warning: bool,
}

impl Default for LogCollector {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            bytes_written: 0,
            bytes_limit: Some(DEFAULT_LOG_MESSAGES_BYTES_LIMIT),
            limit_warning: false,
        }
    }
}

impl LogCollector {
    pub fn log(&mut self, message: &str) {
        let Some(limit) = self.bytes_limit else {
            self.messages.push(message.to_string());
            return;
        };
        let bytes_written = self.bytes_written.saturating_add(message.len());
        if bytes_written >= limit {
            if !self.limit_warning {
                self.limit_warning = true;
                self.messages.push("Log truncated".to_string());
            }
            return;
        }
        self.bytes_written = bytes_written;
        self.messages.push(message.to_string());
    }

    pub fn get_recorded_content(&self) -> &[String] {
        &self.messages
    }

    pub fn new_ref(bytes_limit: Option<usize>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            bytes_limit,
            ..Self::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_once_the_byte_limit_is_crossed() {
        let collector = LogCollector::new_ref(Some(10));
        collector.borrow_mut().log("0123456789");
        collector.borrow_mut().log("overflow");
        let messages = collector.borrow();
        let recorded = messages.get_recorded_content();
        assert_eq!(recorded.last().unwrap(), "Log truncated");
    }
}
