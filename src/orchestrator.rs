use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::compact::Engine;
use crate::error::Error;
use crate::guest::GuestControl;
use crate::locator;
use crate::model::{CompactionOutcome, RunSummary};
use crate::utils::format_size;

/// Everything the run needs, passed in explicitly so tests can substitute
/// fake roots, fake privilege answers and fake consent.
pub struct OrchestratorConfig {
    pub search_roots: Vec<PathBuf>,
    pub image_file_name: String,
    /// Skip the consent gate.
    pub force: bool,
}

/// Phases of a single run. Transitions are strictly forward; every fatal
/// condition aborts the run instead of retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PrivilegeChecked,
    ConsentObtained,
    GuestQuiesced,
    ImagesDiscovered,
    Compacting,
    Reported,
}

/// Final product of a run that made it past all gates. Individual images may
/// still have failed; the exit-code mapping is the caller's concern.
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<CompactionOutcome>,
    pub summary: RunSummary,
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    is_elevated: Box<dyn Fn() -> bool>,
    request_consent: Box<dyn Fn() -> bool>,
    guest: Box<dyn GuestControl>,
    engine: Engine,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        is_elevated: Box<dyn Fn() -> bool>,
        request_consent: Box<dyn Fn() -> bool>,
        guest: Box<dyn GuestControl>,
        engine: Engine,
    ) -> Self {
        Self {
            config,
            is_elevated,
            request_consent,
            guest,
            engine,
        }
    }

    /// Run once, straight through: privilege gate, consent gate, guest
    /// shutdown, discovery, sequential per-image compaction, summary.
    pub fn run(&self) -> Result<RunReport, Error> {
        if !(self.is_elevated)() {
            return Err(Error::NotElevated);
        }
        enter(Phase::PrivilegeChecked);

        if !self.config.force && !(self.request_consent)() {
            return Err(Error::ConsentDeclined);
        }
        enter(Phase::ConsentObtained);

        info!("Checking WSL status...");
        self.guest.query_status()?;
        info!("Shutting down all WSL instances...");
        self.guest.shutdown_all()?;
        enter(Phase::GuestQuiesced);

        info!(
            "Searching for {} under {} root(s)...",
            self.config.image_file_name,
            self.config.search_roots.len()
        );
        let images = locator::discover(&self.config.search_roots, &self.config.image_file_name);
        if images.is_empty() {
            return Err(Error::NoImagesFound);
        }
        enter(Phase::ImagesDiscovered);
        info!("{} image(s) found", images.len());

        enter(Phase::Compacting);
        let mut summary = RunSummary::new(images.len());
        let mut outcomes = Vec::with_capacity(images.len());

        for image in images {
            info!(
                "Compacting {} [{}] ({})",
                image.path.display(),
                image.origin_directory,
                format_size(image.size_bytes_before)
            );
            let outcome = self.engine.compact(&image);
            log_outcome(&outcome);
            summary.record(&outcome);
            outcomes.push(outcome);
        }

        enter(Phase::Reported);
        info!(
            "Run complete: {} / {} images compacted, {} recovered",
            summary.succeeded,
            summary.images_found,
            format_size(summary.bytes_recovered)
        );

        Ok(RunReport { outcomes, summary })
    }
}

fn enter(phase: Phase) {
    debug!("Entering phase {:?}", phase);
}

fn log_outcome(outcome: &CompactionOutcome) {
    if outcome.succeeded {
        match outcome.size_bytes_after {
            Some(after) if after > outcome.image.size_bytes_before => info!(
                "Compacted {} via {}, but the file grew from {} to {}",
                outcome.image.path.display(),
                outcome.method,
                format_size(outcome.image.size_bytes_before),
                format_size(after)
            ),
            Some(after) => info!(
                "Compacted {} via {}: {} -> {} ({} recovered)",
                outcome.image.path.display(),
                outcome.method,
                format_size(outcome.image.size_bytes_before),
                format_size(after),
                format_size(outcome.bytes_recovered())
            ),
            None => info!(
                "Compacted {} via {} (size could not be re-read)",
                outcome.image.path.display(),
                outcome.method
            ),
        }
    } else {
        error!(
            "Failed to compact {} via {}: {}",
            outcome.image.path.display(),
            outcome.method,
            outcome
                .failure_detail
                .as_deref()
                .unwrap_or("no detail recorded")
        );
    }
}
