//! Start and stop the magnifier as a systemd unit.

use std::process::{Command, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to run systemctl: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("systemctl {action} {unit} failed ({status}): {stderr}")]
    Failed {
        action: String,
        unit: String,
        status: String,
        stderr: String,
    },
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Stopped,
}

/// Thin wrapper over `systemctl` for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceController {
    unit: String,
    user: bool,
}

impl ServiceController {
    pub fn new(unit: impl Into<String>, user: bool) -> Self {
        Self {
            unit: unit.into(),
            user,
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Full argument list for `systemctl <action> <unit>`.
    pub fn args(&self, action: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if self.user {
            args.push("--user".to_string());
        }
        if action == "is-active" {
            args.push("--quiet".to_string());
        }
        args.push(action.to_string());
        args.push(self.unit.clone());
        args
    }

    pub fn is_active(&self) -> Result<bool, ServiceError> {
        let status = Command::new("systemctl")
            .args(self.args("is-active"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        Ok(status.success())
    }

    pub fn start(&self) -> Result<(), ServiceError> {
        self.run("start")
    }

    pub fn stop(&self) -> Result<(), ServiceError> {
        self.run("stop")
    }

    /// Stop the unit if it is running, start it otherwise.
    pub fn toggle(&self) -> Result<ToggleOutcome, ServiceError> {
        if self.is_active()? {
            self.stop()?;
            log::info!("Stopped {}", self.unit);
            Ok(ToggleOutcome::Stopped)
        } else {
            self.start()?;
            log::info!("Started {}", self.unit);
            Ok(ToggleOutcome::Started)
        }
    }

    fn run(&self, action: &str) -> Result<(), ServiceError> {
        let output = Command::new("systemctl")
            .args(self.args(action))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ServiceError::Failed {
                action: action.to_string(),
                unit: self.unit.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_unit_args() {
        let service = ServiceController::new("magnifier.service", false);
        assert_eq!(service.args("start"), vec!["start", "magnifier.service"]);
        assert_eq!(
            service.args("is-active"),
            vec!["--quiet", "is-active", "magnifier.service"]
        );
    }

    #[test]
    fn test_user_unit_args() {
        let service = ServiceController::new("magnifier.service", true);
        assert_eq!(
            service.args("stop"),
            vec!["--user", "stop", "magnifier.service"]
        );
    }

    #[test]
    fn test_failed_error_display() {
        let err = ServiceError::Failed {
            action: "start".to_string(),
            unit: "magnifier.service".to_string(),
            status: "exit status: 5".to_string(),
            stderr: "Unit not found.".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("start magnifier.service"));
        assert!(msg.contains("Unit not found."));
    }
}
