use std::path::Path;
use std::process::Command;

use crate::compact::{CompactionTier, TierOutcome};
use crate::model::CompactionMethod;
use crate::utils::decode_console_output;

/// Native tier: `Optimize-VHD -Mode Full` through PowerShell. Available only
/// on editions that ship the Hyper-V module; everywhere else the cmdlet is
/// unknown and the tier reports `Unavailable`.
pub struct OptimizeVhdTier;

impl CompactionTier for OptimizeVhdTier {
    fn method(&self) -> CompactionMethod {
        CompactionMethod::Native
    }

    fn run(&self, image_path: &Path) -> TierOutcome {
        let command = format!(
            "Optimize-VHD -Path \"{}\" -Mode Full",
            image_path.display()
        );
        let output = match Command::new("powershell.exe")
            .args(["-NoProfile", "-NonInteractive", "-Command", &command])
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                return TierOutcome::Unavailable(format!(
                    "powershell.exe could not be started: {err}"
                ))
            }
        };

        if output.status.success() {
            return TierOutcome::Succeeded;
        }

        let stderr = decode_console_output(&output.stderr);
        if cmdlet_missing(&stderr) {
            TierOutcome::Unavailable(
                "Optimize-VHD is not available on this Windows edition".to_string(),
            )
        } else {
            TierOutcome::Failed(format!(
                "Optimize-VHD exited with {}: {}",
                output.status,
                stderr.trim()
            ))
        }
    }
}

fn cmdlet_missing(stderr: &str) -> bool {
    stderr.contains("is not recognized") || stderr.contains("CommandNotFoundException")
}
