use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

use crate::compact::{CompactionTier, TierOutcome};
use crate::model::CompactionMethod;
use crate::utils::decode_console_output;

/// Fallback tier: drive `diskpart` with a synthesized script. The script and
/// both output captures live in exclusively-owned temp files that are removed
/// on every exit path.
pub struct DiskpartTier;

/// The exact command sequence diskpart needs to compact one image in place.
/// The vdisk is attached read-only; compaction works on the container file,
/// not the guest-visible contents.
pub fn render_script(image_path: &Path) -> String {
    format!(
        "select vdisk file=\"{}\"\n\
         attach vdisk readonly\n\
         compact vdisk\n\
         detach vdisk\n\
         exit\n",
        image_path.display()
    )
}

impl CompactionTier for DiskpartTier {
    fn method(&self) -> CompactionMethod {
        CompactionMethod::Diskpart
    }

    fn run(&self, image_path: &Path) -> TierOutcome {
        match run_diskpart(image_path) {
            Ok(outcome) => outcome,
            Err(err) => TierOutcome::Failed(format!("diskpart setup failed: {err}")),
        }
    }
}

fn run_diskpart(image_path: &Path) -> io::Result<TierOutcome> {
    run_diskpart_in(image_path, &env::temp_dir())
}

fn run_diskpart_in(image_path: &Path, temp_dir: &Path) -> io::Result<TierOutcome> {
    // All three NamedTempFiles are unlinked on drop, covering success,
    // failure and early-return paths alike.
    let mut script = NamedTempFile::new_in(temp_dir)?;
    script.write_all(render_script(image_path).as_bytes())?;
    script.flush()?;

    let stdout_capture = NamedTempFile::new_in(temp_dir)?;
    let stderr_capture = NamedTempFile::new_in(temp_dir)?;

    let status = match Command::new("diskpart")
        .arg("/s")
        .arg(script.path())
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_capture.reopen()?))
        .stderr(Stdio::from(stderr_capture.reopen()?))
        .status()
    {
        Ok(status) => status,
        Err(err) => {
            return Ok(TierOutcome::Failed(format!(
                "diskpart could not be started: {err}"
            )))
        }
    };

    if status.success() {
        return Ok(TierOutcome::Succeeded);
    }

    let stderr = decode_console_output(&fs::read(stderr_capture.path())?);
    let stdout = decode_console_output(&fs::read(stdout_capture.path())?);
    // diskpart reports most errors on stdout.
    let detail = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    };
    Ok(TierOutcome::Failed(format!(
        "diskpart exited with {}: {}",
        status,
        detail.trim()
    )))
}
