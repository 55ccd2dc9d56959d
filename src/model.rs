use std::path::PathBuf;
use std::time::SystemTime;

/// One candidate virtual disk image discovered under a search root.
///
/// Created by the locator and read-only afterwards; a run never holds two
/// instances with the same `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDiskImage {
    pub path: PathBuf,
    /// Size at discovery time; compaction results are measured against this.
    pub size_bytes_before: u64,
    pub last_modified: Option<SystemTime>,
    /// Name of the immediate containing directory, used for operator-facing
    /// labeling only (e.g. the distro package directory).
    pub origin_directory: String,
}

/// Which compaction mechanism produced an outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompactionMethod {
    /// Optimize-VHD, the platform's built-in optimizer.
    Native,
    /// Scripted diskpart fallback.
    Diskpart,
    /// No mechanism was attempted.
    #[default]
    None,
}

impl std::fmt::Display for CompactionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompactionMethod::Native => write!(f, "native"),
            CompactionMethod::Diskpart => write!(f, "diskpart"),
            CompactionMethod::None => write!(f, "none"),
        }
    }
}

/// Result of the (up to two) compaction attempts for one image.
#[derive(Debug, Clone)]
pub struct CompactionOutcome {
    pub image: VirtualDiskImage,
    /// The last tier that was attempted.
    pub method: CompactionMethod,
    pub succeeded: bool,
    /// Fresh re-stat of the file after a successful compaction; `None` when
    /// the attempt failed or the re-stat itself failed. Never a stale value.
    pub size_bytes_after: Option<u64>,
    pub failure_detail: Option<String>,
}

impl CompactionOutcome {
    pub fn success(
        image: VirtualDiskImage,
        method: CompactionMethod,
        size_bytes_after: Option<u64>,
    ) -> Self {
        Self {
            image,
            method,
            succeeded: true,
            size_bytes_after,
            failure_detail: None,
        }
    }

    pub fn failure(image: VirtualDiskImage, method: CompactionMethod, detail: String) -> Self {
        Self {
            image,
            method,
            succeeded: false,
            size_bytes_after: None,
            failure_detail: Some(detail),
        }
    }

    /// Bytes freed by this outcome. An image that grew contributes zero here,
    /// but the growth is still visible through `size_bytes_after`.
    pub fn bytes_recovered(&self) -> u64 {
        match self.size_bytes_after {
            Some(after) if self.succeeded => self.image.size_bytes_before.saturating_sub(after),
            _ => 0,
        }
    }
}

/// Running aggregate over all outcomes in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub images_found: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub bytes_recovered: u64,
}

impl RunSummary {
    pub fn new(images_found: usize) -> Self {
        Self {
            images_found,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &CompactionOutcome) {
        if outcome.succeeded {
            self.succeeded += 1;
            self.bytes_recovered += outcome.bytes_recovered();
        } else {
            self.failed += 1;
        }
    }
}
