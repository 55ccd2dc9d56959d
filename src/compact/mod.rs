pub mod diskpart;
pub mod native;

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::model::{CompactionMethod, CompactionOutcome, VirtualDiskImage};

pub use diskpart::DiskpartTier;
pub use native::OptimizeVhdTier;

/// Result of one compaction mechanism against one image.
///
/// `Unavailable` and `Failed` are distinguished so the engine can log them
/// differently, but both trigger the same fall-through to the next tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    Succeeded,
    /// The mechanism is not present on this platform edition.
    Unavailable(String),
    Failed(String),
}

/// One compaction mechanism. Implementations must leave no partial state
/// behind on failure.
pub trait CompactionTier {
    fn method(&self) -> CompactionMethod;
    fn run(&self, image_path: &Path) -> TierOutcome;
}

/// Two-tier compaction strategy: the native optimizer is preferred, the
/// scripted diskpart path is the fallback. Strictly ordered, no retries.
pub struct Engine {
    native: Box<dyn CompactionTier>,
    fallback: Box<dyn CompactionTier>,
}

impl Engine {
    pub fn new(native: Box<dyn CompactionTier>, fallback: Box<dyn CompactionTier>) -> Self {
        Self { native, fallback }
    }

    /// Engine wired to the real platform mechanisms.
    pub fn platform_default() -> Self {
        Self::new(Box::new(OptimizeVhdTier), Box::new(DiskpartTier))
    }

    /// Attempt to compact one image. The native tier runs first; any
    /// non-success there is a soft failure that falls through to the
    /// fallback tier. The fallback's verdict is final for this image.
    pub fn compact(&self, image: &VirtualDiskImage) -> CompactionOutcome {
        match self.native.run(&image.path) {
            TierOutcome::Succeeded => {
                debug!("Native compaction succeeded for {}", image.path.display());
                return finish_success(image, self.native.method());
            }
            TierOutcome::Unavailable(detail) => {
                warn!(
                    "Native compaction unavailable for {}, falling back to diskpart: {}",
                    image.path.display(),
                    detail
                );
            }
            TierOutcome::Failed(detail) => {
                warn!(
                    "Native compaction failed for {}, falling back to diskpart: {}",
                    image.path.display(),
                    detail
                );
            }
        }

        match self.fallback.run(&image.path) {
            TierOutcome::Succeeded => {
                debug!("Fallback compaction succeeded for {}", image.path.display());
                finish_success(image, self.fallback.method())
            }
            TierOutcome::Unavailable(detail) | TierOutcome::Failed(detail) => {
                CompactionOutcome::failure(image.clone(), self.fallback.method(), detail)
            }
        }
    }
}

/// Re-stat the file for the after-size. A failed re-stat leaves the size
/// absent rather than reusing the discovery-time value.
fn finish_success(image: &VirtualDiskImage, method: CompactionMethod) -> CompactionOutcome {
    let size_bytes_after = match fs::metadata(&image.path) {
        Ok(metadata) => Some(metadata.len()),
        Err(err) => {
            warn!(
                "Compaction of {} succeeded but the size could not be re-read: {}",
                image.path.display(),
                err
            );
            None
        }
    };
    CompactionOutcome::success(image.clone(), method, size_bytes_after)
}
