//! Display power saving via `xset`.
//!
//! Failures here never stop the magnifier: a missing `xset` or a display
//! without DPMS just logs a warning.

use std::process::{Command, Stdio};

/// Screen blanking defaults restored on exit.
const DEFAULT_DPMS_SECS: u32 = 600;

/// Builds and runs the display power commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPower {
    manage: bool,
    timeout_secs: u32,
}

impl DisplayPower {
    pub fn new(manage: bool, timeout_secs: u32) -> Self {
        Self {
            manage,
            timeout_secs,
        }
    }

    pub fn is_managed(&self) -> bool {
        self.manage
    }

    /// Commands that set the blank timeout for the session.
    pub fn apply_commands(&self) -> Vec<Vec<String>> {
        let t = self.timeout_secs.to_string();
        vec![
            argv(&["xset", "s", &t]),
            argv(&["xset", "dpms", &t, &t, &t]),
        ]
    }

    /// Commands that turn the screen back on and restart the blank timer.
    pub fn wake_commands(&self) -> Vec<Vec<String>> {
        vec![
            argv(&["xset", "s", "reset"]),
            argv(&["xset", "dpms", "force", "on"]),
        ]
    }

    /// Commands that put back the system defaults.
    pub fn restore_commands(&self) -> Vec<Vec<String>> {
        let t = DEFAULT_DPMS_SECS.to_string();
        vec![
            argv(&["xset", "s", "default"]),
            argv(&["xset", "dpms", &t, &t, &t]),
        ]
    }

    pub fn apply(&self) {
        if self.manage {
            log::info!("Screen blank timeout set to {}s", self.timeout_secs);
            run_all(&self.apply_commands());
        }
    }

    /// Waking always runs, even when the timeout is not managed.
    pub fn wake(&self) {
        run_all(&self.wake_commands());
    }

    pub fn restore(&self) {
        if self.manage {
            run_all(&self.restore_commands());
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

fn run_all(commands: &[Vec<String>]) {
    for command in commands {
        if let Err(msg) = run(command) {
            log::warn!("{}", msg);
        }
    }
}

fn run(command: &[String]) -> Result<(), String> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| "empty command".to_string())?;
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| format!("Failed to run '{}': {}", command.join(" "), e))?;

    if output.status.success() {
        log::debug!("Ran '{}'", command.join(" "));
        Ok(())
    } else {
        Err(format!(
            "'{}' exited with {}: {}",
            command.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_commands_use_timeout() {
        let power = DisplayPower::new(true, 300);
        assert_eq!(
            power.apply_commands(),
            vec![
                argv(&["xset", "s", "300"]),
                argv(&["xset", "dpms", "300", "300", "300"]),
            ]
        );
    }

    #[test]
    fn test_wake_and_restore_commands() {
        let power = DisplayPower::new(false, 60);
        assert_eq!(power.wake_commands()[1], argv(&["xset", "dpms", "force", "on"]));
        assert_eq!(power.restore_commands()[0], argv(&["xset", "s", "default"]));
        assert!(!power.is_managed());
    }

    #[test]
    fn test_run_missing_program_is_an_error() {
        let result = run(&argv(&["magnifier-no-such-binary-xyz"]));
        assert!(result.unwrap_err().contains("Failed to run"));
        assert!(run(&[]).is_err());
    }
}
