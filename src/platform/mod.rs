#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub fn is_elevated() -> bool {
    windows::is_elevated()
}

/// Elevation is a Windows concept; everywhere else the gate reports false
/// so the orchestrator refuses to run.
#[cfg(not(target_os = "windows"))]
pub fn is_elevated() -> bool {
    false
}
