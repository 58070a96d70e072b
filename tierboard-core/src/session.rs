//! TierBoard - one board, its generator and its exporter behind a single API.
//!
//! Both front ends drive the same two triggers: [`TierBoard::generate`]
//! replaces the board wholesale and [`TierBoard::export`] ships whatever is
//! currently rendered.

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::board::BoardState;
use crate::config::{BoardConfig, ConfigError};
use crate::export::{export_view, ExportError, ExportOutcome, Exporter};
use crate::raster::Rasterizer;
use crate::sampler::{GenerationReport, Progress, SampleError, Sampler};
use crate::source::EntitySource;
use crate::view::BoardView;

/// Errors from TierBoard operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Nothing to export yet - generate a board first")]
    NoBoard,
}

/// A tier board session over an [`EntitySource`].
pub struct TierBoard<S> {
    source: S,
    sampler: Sampler,
    rasterizer: Rasterizer,
    exporter: Exporter,
    rng: StdRng,
    state: BoardState,
    view: BoardView,
}

impl<S: EntitySource> TierBoard<S> {
    pub fn new(source: S, sampler: Sampler, exporter: Exporter) -> Self {
        Self {
            source,
            sampler,
            rasterizer: Rasterizer::default(),
            exporter,
            rng: StdRng::from_entropy(),
            state: BoardState::Empty,
            view: BoardView::default(),
        }
    }

    /// Build a session with the sampler, exporter and RNG `config` describes.
    pub fn from_config(source: S, config: &BoardConfig) -> Result<Self, SessionError> {
        Ok(Self::new(source, config.sampler()?, config.exporter()).with_rng(config.rng()))
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Rasterizer) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn view(&self) -> &BoardView {
        &self.view
    }

    pub fn report(&self) -> Option<&GenerationReport> {
        self.state.report()
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn generate(&mut self) -> Result<&GenerationReport, SessionError> {
        self.generate_with_progress(|_| {}).await
    }

    /// Discard the current board and run a fresh generation.
    ///
    /// On success the new board is rendered and the state becomes `Ready`.
    /// An aborted run leaves the session `Empty`; its partial board is only
    /// reachable through the returned error.
    pub async fn generate_with_progress<F>(
        &mut self,
        mut on_progress: F,
    ) -> Result<&GenerationReport, SessionError>
    where
        F: FnMut(Progress),
    {
        let budget = self.sampler.config().attempt_budget;
        self.view.clear();
        self.state = BoardState::Loading { attempts: 0, budget };

        let state = &mut self.state;
        let result = self
            .sampler
            .generate_with_progress(&self.source, &mut self.rng, |progress| {
                *state = BoardState::Loading {
                    attempts: progress.attempts,
                    budget: progress.budget,
                };
                on_progress(progress);
            })
            .await;

        match result {
            Ok(report) => {
                BoardView::render_into(&report.board, &mut self.view);
                self.state = BoardState::Ready(report);
                self.state.report().ok_or(SessionError::NoBoard)
            }
            Err(e) => {
                self.state = BoardState::Empty;
                Err(e.into())
            }
        }
    }

    /// Rasterize the rendered board and run the export policy.
    pub async fn export(&self) -> Result<ExportOutcome, SessionError> {
        if self.view.is_blank() {
            return Err(SessionError::NoBoard);
        }
        Ok(export_view(&self.view, &self.source, &self.rasterizer, &self.exporter).await?)
    }
}
