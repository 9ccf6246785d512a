//! Print handler for configurable output.
//!
//! `PRINT` output is directed to one of:
//! - stdout (default, the `prefix` driver)
//! - a buffer (tests and embedding hosts)
//! - nowhere (silent runs)
//!
//! Enum dispatch instead of trait objects: the set of sinks is closed.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Print handler that captures output to a buffer.
#[derive(Default)]
pub struct BufferPrintHandler {
    buffer: Mutex<String>,
}

impl BufferPrintHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn println(&self, msg: &str) {
        let mut buf = self.buffer.lock();
        buf.push_str(msg);
        buf.push('\n');
    }

    pub fn print(&self, msg: &str) {
        self.buffer.lock().push_str(msg);
    }

    pub fn get_output(&self) -> String {
        self.buffer.lock().clone()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

/// Output sink for `PRINT`.
pub enum PrintHandlerImpl {
    /// Writes to stdout (default).
    Stdout,
    /// Captures to a buffer.
    Buffer(BufferPrintHandler),
    /// Discards all output.
    Silent,
}

impl PrintHandlerImpl {
    /// Print a line (with newline).
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => {
                // A closed stdout is not a script error.
                let _ = writeln!(std::io::stdout().lock(), "{msg}");
            }
            Self::Buffer(h) => h.println(msg),
            Self::Silent => {}
        }
    }

    /// Print without newline.
    pub fn print(&self, msg: &str) {
        match self {
            Self::Stdout => {
                let mut out = std::io::stdout().lock();
                let _ = out.write_all(msg.as_bytes());
                let _ = out.flush();
            }
            Self::Buffer(h) => h.print(msg),
            Self::Silent => {}
        }
    }

    /// Captured output; empty for handlers that don't capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(h) => h.get_output(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(h) = self {
            h.clear();
        }
    }
}

/// Shared print handler; interpreters on several threads may hold one.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(BufferPrintHandler::new()))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;

    #[test]
    fn buffer_handler_println_captures_with_newline() {
        let handler = BufferPrintHandler::new();
        handler.println("hello");
        assert_eq!(handler.get_output(), "hello\n");
    }

    #[test]
    fn buffer_handler_mixed_prints() {
        let handler = buffer_handler();
        handler.print("hello");
        handler.print(" ");
        handler.println("world");
        assert_eq!(handler.get_output(), "hello world\n");
        handler.clear();
        assert!(handler.get_output().is_empty());
    }

    #[test]
    fn silent_and_stdout_capture_nothing() {
        let silent = silent_handler();
        silent.println("hello");
        assert_eq!(silent.get_output(), "");
        assert_eq!(stdout_handler().get_output(), "");
    }

    #[test]
    fn buffer_handler_is_thread_safe() {
        let handler = buffer_handler();
        let handler2 = Arc::clone(&handler);
        let t1 = std::thread::spawn(move || {
            for _ in 0..100 {
                handler2.println("a");
            }
        });
        for _ in 0..100 {
            handler.println("b");
        }
        t1.join().unwrap();
        assert_eq!(handler.get_output().lines().count(), 200);
    }
}
