//! Output hooks for the `print` and `write` natives.

use std::{
    cell::RefCell,
    io::{self, Write as _},
    rc::Rc,
};

/// Trait for handling script output.
///
/// Register an implementation with [`crate::Vm::set_write_hook`] to capture
/// or redirect output from scripts. When no hook is registered, `print` and
/// `write` silently discard their output.
pub trait WriteHook {
    /// Writes a chunk of output text. Called once per formatted argument;
    /// separators and terminators arrive through [`WriteHook::write_char`].
    fn write_str(&mut self, output: &str);

    /// Writes a single separator or terminator character.
    fn write_char(&mut self, ch: char) {
        let mut buf = [0_u8; 4];
        self.write_str(ch.encode_utf8(&mut buf));
    }
}

/// `WriteHook` that writes to stdout.
#[derive(Debug, Default)]
pub struct StdWrite;

impl WriteHook for StdWrite {
    fn write_str(&mut self, output: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(output.as_bytes());
        let _ = stdout.flush();
    }
}

/// `WriteHook` that collects all output into a shared string buffer.
///
/// The hook is owned by the VM once registered, so the buffer is shared:
/// clone the hook (cheaply) before registering and read the clone later.
///
/// Useful for testing or capturing script output programmatically.
#[derive(Debug, Default, Clone)]
pub struct CollectStringWrite {
    buffer: Rc<RefCell<String>>,
}

impl CollectStringWrite {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the collected output.
    ///
    /// # Panics
    /// Panics if called re-entrantly from inside a write.
    #[must_use]
    pub fn output(&self) -> String {
        self.buffer.borrow().clone()
    }

    /// Clears the buffer and returns what it held.
    #[must_use]
    pub fn take_output(&self) -> String {
        std::mem::take(&mut *self.buffer.borrow_mut())
    }
}

impl WriteHook for CollectStringWrite {
    fn write_str(&mut self, output: &str) {
        self.buffer.borrow_mut().push_str(output);
    }

    fn write_char(&mut self, ch: char) {
        self.buffer.borrow_mut().push(ch);
    }
}

/// `WriteHook` that ignores all output.
///
/// Useful for suppressing output during testing or benchmarking; behaves
/// the same as registering no hook at all.
#[derive(Debug, Default)]
pub struct NoWrite;

impl WriteHook for NoWrite {
    fn write_str(&mut self, _output: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A collector clone observes writes made through the registered hook.
    #[test]
    fn collector_shares_buffer() {
        let collector = CollectStringWrite::new();
        let mut hook = collector.clone();
        hook.write_str("hello");
        hook.write_char('\n');
        assert_eq!(collector.output(), "hello\n");
        assert_eq!(collector.take_output(), "hello\n");
        assert_eq!(collector.output(), "");
    }
}
