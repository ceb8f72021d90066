//! Line-oriented terminal display.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use super::DisplayAdapter;
use crate::domain::{RunStatus, Step, StepStatus};

/// Writes one line per notification, prefixed with the card title
pub struct TerminalDisplay {
    title: String,
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalDisplay {
    /// Display writing to stdout
    pub fn stdout(title: impl Into<String>) -> Self {
        Self::with_writer(title, Box::new(io::stdout()))
    }

    /// Display writing to an arbitrary sink
    pub fn with_writer(title: impl Into<String>, out: Box<dyn Write + Send>) -> Self {
        Self {
            title: title.into(),
            out: Mutex::new(out),
        }
    }

    fn write_line(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // A closed terminal is not the runner's problem
        let _ = writeln!(out, "[{}] {}", self.title, line);
        let _ = out.flush();
    }
}

/// Render a run status the way the terminal shows it
pub fn describe_status(status: &RunStatus, attempt: u32) -> String {
    let attempt_suffix = if attempt > 0 {
        format!(" (attempt {})", attempt)
    } else {
        String::new()
    };

    match status {
        RunStatus::Idle => "idle".to_string(),
        RunStatus::Running => format!("running...{}", attempt_suffix),
        RunStatus::Succeeded { result } => format!("succeeded{}: {}", attempt_suffix, result),
        RunStatus::Failed { error } => {
            format!("failed{} [{}]: {}", attempt_suffix, error.label(), error)
        }
    }
}

/// Render a step transition the way the terminal shows it
pub fn describe_step(index: usize, step: &Step, status: StepStatus) -> String {
    let marker = match status {
        StepStatus::Pending => " ",
        StepStatus::Running => ">",
        StepStatus::Succeeded => "+",
        StepStatus::Failed => "x",
        StepStatus::Abandoned => "-",
    };
    format!("  {} {}. {} ({:?})", marker, index + 1, step.name, status)
}

impl DisplayAdapter for TerminalDisplay {
    fn name(&self) -> &str {
        "terminal"
    }

    fn on_status_change(&self, status: &RunStatus, attempt: u32) {
        self.write_line(&describe_status(status, attempt));
    }

    fn on_step_change(&self, index: usize, step: &Step, status: StepStatus) {
        self.write_line(&describe_step(index, step, status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;
    use serde_json::json;
    use std::sync::Arc;

    /// Shared buffer so the test can read what the display wrote
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_describe_status() {
        assert_eq!(describe_status(&RunStatus::Running, 0), "running...");
        assert_eq!(describe_status(&RunStatus::Running, 2), "running... (attempt 2)");
        assert_eq!(
            describe_status(
                &RunStatus::Failed {
                    error: FailureKind::Timeout { limit_ms: 2000 }
                },
                0
            ),
            "failed [Timeout]: Request timed out after 2000ms"
        );
    }

    #[test]
    fn test_writes_prefixed_lines() {
        let buffer = SharedBuffer::default();
        let display = TerminalDisplay::with_writer("Race Between Tasks", Box::new(buffer.clone()));
        let step = Step::succeed("fallback", 1500, json!("fallback"));

        display.on_status_change(&RunStatus::Running, 0);
        display.on_step_change(1, &step, StepStatus::Succeeded);

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "[Race Between Tasks] running...");
        assert_eq!(lines[1], "[Race Between Tasks]   + 2. fallback (Succeeded)");
    }
}
