use std::process::Command;
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::config::DEFAULT_SHUTDOWN_GRACE_SECS;
use crate::error::Error;
use crate::utils::decode_console_output;

/// Host-side control surface over the WSL service. Compaction requires the
/// backing image files to be unlocked, so both operations are fatal on
/// failure.
pub trait GuestControl {
    /// Confirm the subsystem answers a list-distributions query. Success
    /// means it is reachable, not that any distro is running.
    fn query_status(&self) -> Result<(), Error>;

    /// Shut down every running instance and wait for the service to release
    /// its handles on the image files.
    fn shutdown_all(&self) -> Result<(), Error>;
}

/// `wsl.exe`-backed implementation.
pub struct WslController {
    /// Wait after `wsl --shutdown` returns before reporting success. The
    /// shutdown command returns before the service drops its file handles;
    /// this is a heuristic mitigation, not a lock-release guarantee.
    grace_period: Duration,
}

impl WslController {
    pub fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }
}

impl Default for WslController {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS))
    }
}

impl GuestControl for WslController {
    fn query_status(&self) -> Result<(), Error> {
        let output = Command::new("wsl.exe")
            .args(["--list", "--quiet"])
            .output()
            .map_err(|err| Error::GuestUnreachable(format!("wsl.exe could not be started: {err}")))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::GuestUnreachable(format!(
                "wsl.exe --list exited with {}: {}",
                output.status,
                decode_console_output(&output.stderr).trim()
            )))
        }
    }

    fn shutdown_all(&self) -> Result<(), Error> {
        let output = Command::new("wsl.exe")
            .arg("--shutdown")
            .output()
            .map_err(|err| Error::ShutdownFailed(format!("wsl.exe could not be started: {err}")))?;

        if !output.status.success() {
            return Err(Error::ShutdownFailed(format!(
                "wsl.exe --shutdown exited with {}: {}",
                output.status,
                decode_console_output(&output.stderr).trim()
            )));
        }

        debug!(
            "Waiting {:?} for WSL to release image file handles",
            self.grace_period
        );
        thread::sleep(self.grace_period);
        Ok(())
    }
}
