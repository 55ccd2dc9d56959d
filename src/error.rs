use thiserror::Error;

/// Fatal conditions that abort a whole run. Per-image compaction failures are
/// not errors at this level; they are recorded in the image's outcome and the
/// run continues.
#[derive(Error, Debug)]
pub enum Error {
    #[error("administrator privileges are required; re-run from an elevated prompt")]
    NotElevated,

    #[error("aborted: confirmation was not given")]
    ConsentDeclined,

    #[error("WSL subsystem is unreachable: {0}")]
    GuestUnreachable(String),

    #[error("WSL shutdown failed: {0}")]
    ShutdownFailed(String),

    #[error("no virtual disk images found under the configured search roots")]
    NoImagesFound,
}
