//! Main application state and logic

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tierboard_core::{
    render_png, BoardState, BoardView, Confirmation, EntitySource, ExportError, ExportOutcome,
    Exporter, GenerationReport, Progress, Rasterizer, SampleError, Sampler,
};
use tokio::sync::mpsc;

use crate::ui::theme::BoardTheme;

/// Messages from background tasks back to the UI loop.
#[derive(Debug)]
pub enum WorkerEvent {
    Progress(Progress),
    Generated(Result<GenerationReport, SampleError>),
    Exported(Result<ExportOutcome, ExportError>),
    /// A background task died without reporting a result.
    Crashed { task: WorkerTask, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerTask {
    Generate,
    Export,
}

/// Main application state
pub struct App {
    source: Arc<dyn EntitySource>,
    sampler: Sampler,
    rasterizer: Rasterizer,
    exporter: Arc<Exporter>,
    /// Seeds one child RNG per run.
    rng: StdRng,

    // Channel communication with background tasks
    worker_tx: mpsc::UnboundedSender<WorkerEvent>,
    worker_rx: mpsc::UnboundedReceiver<WorkerEvent>,

    // Board
    pub state: BoardState,
    pub view: BoardView,
    pub output_dir: PathBuf,

    // UI state
    pub theme: BoardTheme,
    pub board_scroll: usize,
    show_help: bool,
    exporting: bool,

    // Status
    status_message: Option<String>,
    confirmation: Option<Confirmation>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        source: Arc<dyn EntitySource>,
        sampler: Sampler,
        exporter: Exporter,
        rng: StdRng,
    ) -> Self {
        let (worker_tx, worker_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            source,
            sampler,
            rasterizer: Rasterizer::default(),
            exporter: Arc::new(exporter),
            rng,
            worker_tx,
            worker_rx,
            state: BoardState::Empty,
            view: BoardView::default(),
            output_dir: PathBuf::from("."),
            theme: BoardTheme::default(),
            board_scroll: 0,
            show_help: false,
            exporting: false,
            status_message: None,
            confirmation: None,
            should_quit: false,
        };
        app.set_status("Press 'g' to generate a board, '?' for help");
        app
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Kick off a fresh generation in the background.
    ///
    /// The previous board disappears immediately; the new one only shows up
    /// once the run finishes.
    pub fn start_generation(&mut self) {
        if self.state.is_loading() {
            self.set_status("Already generating - wait for the current board");
            return;
        }

        let budget = self.sampler.config().attempt_budget;
        self.state = BoardState::Loading { attempts: 0, budget };
        self.view.clear();
        self.board_scroll = 0;
        self.set_status("Generating...");

        let source = Arc::clone(&self.source);
        let sampler = self.sampler.clone();
        let progress_tx = self.worker_tx.clone();
        let mut rng = StdRng::seed_from_u64(self.rng.gen());

        self.spawn_worker(WorkerTask::Generate, async move {
            let result = sampler
                .generate_with_progress(source.as_ref(), &mut rng, |progress| {
                    let _ = progress_tx.send(WorkerEvent::Progress(progress));
                })
                .await;
            WorkerEvent::Generated(result)
        });
    }

    /// Export whatever board is currently shown.
    pub fn start_export(&mut self) {
        if self.view.is_blank() {
            self.set_status("Nothing to export yet - press 'g' first");
            return;
        }
        if self.exporting {
            return;
        }

        self.exporting = true;
        self.set_status("Exporting...");

        let view = self.view.clone();
        let source = Arc::clone(&self.source);
        let rasterizer = self.rasterizer.clone();
        let exporter = Arc::clone(&self.exporter);

        self.spawn_worker(WorkerTask::Export, async move {
            let png = match render_png(&view, source.as_ref(), &rasterizer).await {
                Ok(png) => png,
                Err(e) => return WorkerEvent::Exported(Err(e.into())),
            };
            // Sinks write files and wait on child processes.
            match tokio::task::spawn_blocking(move || exporter.export(&png)).await {
                Ok(result) => WorkerEvent::Exported(result),
                Err(e) => WorkerEvent::Crashed {
                    task: WorkerTask::Export,
                    reason: e.to_string(),
                },
            }
        });
    }

    /// Run `work` on its own task and forward its event, or a `Crashed`
    /// event if it panics.
    fn spawn_worker<F>(&self, task: WorkerTask, work: F)
    where
        F: Future<Output = WorkerEvent> + Send + 'static,
    {
        let tx = self.worker_tx.clone();
        let handle = tokio::spawn(work);
        tokio::spawn(async move {
            let event = handle.await.unwrap_or_else(|e| WorkerEvent::Crashed {
                task,
                reason: e.to_string(),
            });
            let _ = tx.send(event);
        });
    }

    /// Apply every event the background tasks have sent so far.
    pub fn drain_worker_events(&mut self) {
        while let Ok(event) = self.worker_rx.try_recv() {
            self.handle_worker_event(event);
        }
    }

    /// Wait for the next background event and apply it.
    #[cfg(test)]
    pub async fn next_worker_event(&mut self) {
        if let Some(event) = self.worker_rx.recv().await {
            self.handle_worker_event(event);
        }
    }

    pub fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Progress(progress) => {
                if self.state.is_loading() {
                    self.state = BoardState::Loading {
                        attempts: progress.attempts,
                        budget: progress.budget,
                    };
                }
            }
            WorkerEvent::Generated(Ok(report)) => {
                BoardView::render_into(&report.board, &mut self.view);
                self.set_status(summarize(&report));
                self.state = BoardState::Ready(report);
            }
            WorkerEvent::Generated(Err(e)) => {
                log::error!("generation failed: {e}");
                self.state = BoardState::Empty;
                self.view.clear();
                self.set_status(format!("Generation failed: {e}"));
            }
            WorkerEvent::Exported(Ok(outcome)) => {
                self.exporting = false;
                self.confirmation = outcome.confirmation(Instant::now());
                self.set_status(format!("Board {}", outcome.delivery));
            }
            WorkerEvent::Exported(Err(e)) => {
                self.exporting = false;
                self.set_status(format!("Export failed: {e}"));
            }
            WorkerEvent::Crashed { task, reason } => {
                log::error!("{task:?} task crashed: {reason}");
                match task {
                    WorkerTask::Generate => {
                        self.state = BoardState::Empty;
                        self.view.clear();
                        self.set_status(format!("Generation failed: {reason}"));
                    }
                    WorkerTask::Export => {
                        self.exporting = false;
                        self.set_status(format!("Export failed: {reason}"));
                    }
                }
            }
        }
    }

    /// Expire the transient confirmation.
    pub fn tick(&mut self, now: Instant) {
        if self
            .confirmation
            .as_ref()
            .is_some_and(|c| c.is_expired(now))
        {
            self.confirmation = None;
        }
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.board_scroll = self.board_scroll.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        let max = self.view.rows.len().saturating_sub(1);
        self.board_scroll = (self.board_scroll + rows).min(max);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    pub fn help_visible(&self) -> bool {
        self.show_help
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }
}

/// One-line summary of a finished run.
pub fn summarize(report: &GenerationReport) -> String {
    if report.budget_exhausted {
        format!(
            "Attempt budget spent: {} placed in {} attempts \
             ({} duplicates, {} tier full, {} failed)",
            report.accepted(),
            report.attempts,
            report.duplicates,
            report.tier_full,
            report.fetch_failures()
        )
    } else {
        format!(
            "Board ready: {} placed in {} attempts",
            report.accepted(),
            report.attempts
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tierboard_core::testing::{DeliveryLog, MockSource, RecordingSink};
    use tierboard_core::{
        EntityRecord, FetchError, FetchFailurePolicy, SamplerConfig, SinkKind, Tier,
    };

    /// A source whose lookups blow up instead of returning an error.
    struct PanickingSource;

    #[async_trait::async_trait]
    impl EntitySource for PanickingSource {
        async fn fetch(&self, id: u32) -> Result<EntityRecord, FetchError> {
            panic!("decoder failure on id {id}")
        }

        async fn fetch_sprite(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn app_with(source: MockSource, config: SamplerConfig, exporter: Exporter) -> App {
        App::new(
            Arc::new(source),
            Sampler::new(config).unwrap(),
            exporter,
            StdRng::seed_from_u64(17),
        )
    }

    async fn finish_generation(app: &mut App) {
        while app.state.is_loading() {
            app.next_worker_event().await;
        }
    }

    #[tokio::test]
    async fn test_generation_fills_view() {
        let mut app = app_with(
            MockSource::tiered(1..=25, |id| 180 + id * 20),
            SamplerConfig::default().with_id_range(1..=25),
            Exporter::new(),
        );

        app.start_generation();
        assert!(app.view.is_blank());
        finish_generation(&mut app).await;

        assert!(matches!(app.state, BoardState::Ready(_)));
        assert_eq!(app.view.card_count(), 25);
        assert_eq!(app.view.row(Tier::Five).unwrap().cards.len(), 5);
        assert!(app.status_message().unwrap().starts_with("Board ready"));
    }

    #[tokio::test]
    async fn test_generate_while_loading_is_ignored() {
        let mut app = app_with(
            MockSource::tiered(1..=25, |id| 180 + id * 20),
            SamplerConfig::default().with_id_range(1..=25),
            Exporter::new(),
        );

        app.start_generation();
        app.start_generation();
        assert!(app.status_message().unwrap().starts_with("Already generating"));

        finish_generation(&mut app).await;
        // Only one run was started, so exactly one Generated event arrives.
        app.drain_worker_events();
        assert_eq!(app.view.card_count(), 25);
    }

    #[tokio::test]
    async fn test_aborted_generation_leaves_board_empty() {
        let mut app = app_with(
            MockSource::new().failing(1),
            SamplerConfig::default()
                .with_id_range(1..=1)
                .with_fetch_failure_policy(FetchFailurePolicy::Abort),
            Exporter::new(),
        );

        app.start_generation();
        finish_generation(&mut app).await;

        assert!(matches!(app.state, BoardState::Empty));
        assert!(app.view.is_blank());
        assert!(app.status_message().unwrap().starts_with("Generation failed"));
    }

    #[tokio::test]
    async fn test_crashed_generation_resets_to_empty() {
        let mut app = App::new(
            Arc::new(PanickingSource),
            Sampler::new(SamplerConfig::default()).unwrap(),
            Exporter::new(),
            StdRng::seed_from_u64(17),
        );

        app.start_generation();
        finish_generation(&mut app).await;

        assert!(matches!(app.state, BoardState::Empty));
        assert!(app.view.is_blank());
        assert!(app.status_message().unwrap().starts_with("Generation failed"));

        // The crashed run no longer blocks a new one.
        app.start_generation();
        assert!(app.state.is_loading());
        finish_generation(&mut app).await;
    }

    #[tokio::test]
    async fn test_export_requires_board() {
        let mut app = app_with(MockSource::new(), SamplerConfig::default(), Exporter::new());
        app.start_export();
        assert!(!app.is_exporting());
        assert!(app.status_message().unwrap().starts_with("Nothing to export"));
    }

    #[tokio::test]
    async fn test_clipboard_export_flashes_confirmation() {
        let log = DeliveryLog::default();
        let mut app = app_with(
            MockSource::tiered(1..=25, |id| 180 + id * 20),
            SamplerConfig::default().with_id_range(1..=25),
            Exporter::new().with_sink(RecordingSink::new(SinkKind::Clipboard, &log)),
        );

        app.start_generation();
        finish_generation(&mut app).await;

        app.start_export();
        assert!(app.is_exporting());
        while app.is_exporting() {
            app.next_worker_event().await;
        }

        assert_eq!(log.calls(), vec![SinkKind::Clipboard]);
        let expires_at = app.confirmation().unwrap().expires_at;
        app.tick(expires_at - Duration::from_millis(1));
        assert!(app.confirmation().is_some());
        app.tick(expires_at);
        assert!(app.confirmation().is_none());
    }

    #[test]
    fn test_scroll_is_clamped_to_rows() {
        let mut app = app_with(MockSource::new(), SamplerConfig::default(), Exporter::new());
        app.view = BoardView::render(&tierboard_core::Board::default());

        app.scroll_down(10);
        assert_eq!(app.board_scroll, 4);
        app.scroll_up(1);
        assert_eq!(app.board_scroll, 3);
        app.scroll_up(10);
        assert_eq!(app.board_scroll, 0);
    }
}
