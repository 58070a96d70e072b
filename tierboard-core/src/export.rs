//! Delivering a rasterized board.
//!
//! An [`Exporter`] walks a prioritized list of [`ExportSink`]s. Sinks whose
//! capability is missing are skipped, sinks that fail fall through to the
//! next one, and the first delivery wins.

use std::env;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::raster::{PngImage, RasterError, Rasterizer, SpriteSheet};
use crate::source::EntitySource;
use crate::view::BoardView;

/// File name used when the board is saved or handed to a share target.
pub const DOWNLOAD_FILE_NAME: &str = "pokemon-board.png";

/// How long a clipboard confirmation stays on screen.
pub const CONFIRMATION_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Clipboard,
    Share,
    Download,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Clipboard => f.write_str("clipboard"),
            SinkKind::Share => f.write_str("share"),
            SinkKind::Download => f.write_str("download"),
        }
    }
}

/// Where an exported image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Clipboard { program: String },
    Shared { path: PathBuf },
    Saved { path: PathBuf },
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Clipboard { program } => write!(f, "copied to clipboard via {program}"),
            Delivery::Shared { path } => write!(f, "opened {}", path.display()),
            Delivery::Saved { path } => write!(f, "saved to {}", path.display()),
        }
    }
}

/// A sink that was passed over on the way to the one that delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkAttempt {
    Skipped(SinkKind),
    Failed { kind: SinkKind, reason: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0} is not available")]
    Unavailable(SinkKind),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{program} exited with {status}")]
    Command { program: String, status: String },

    #[error(transparent)]
    Encode(#[from] RasterError),

    #[error("No export sink could deliver the board ({} tried)", .attempts.len())]
    Exhausted { attempts: Vec<SinkAttempt> },
}

/// A short-lived message for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub message: String,
    pub expires_at: Instant,
}

impl Confirmation {
    pub fn new(message: impl Into<String>, now: Instant) -> Self {
        Self {
            message: message.into(),
            expires_at: now + CONFIRMATION_TTL,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub sink: SinkKind,
    pub delivery: Delivery,
    /// Sinks tried before `sink`, in order.
    pub fallthrough: Vec<SinkAttempt>,
}

impl ExportOutcome {
    /// Only a clipboard copy gets a transient confirmation; the other sinks
    /// leave something the user can see.
    pub fn confirmation(&self, now: Instant) -> Option<Confirmation> {
        match self.delivery {
            Delivery::Clipboard { .. } => Some(Confirmation::new("Copied!", now)),
            _ => None,
        }
    }
}

/// One way of getting a PNG to the user.
pub trait ExportSink: Send + Sync {
    fn kind(&self) -> SinkKind;

    /// Whether the capability exists at all on this system.
    fn is_available(&self) -> bool;

    fn deliver(&self, png: &PngImage) -> Result<Delivery, ExportError>;
}

/// Ordered export policy.
#[derive(Default)]
pub struct Exporter {
    sinks: Vec<Box<dyn ExportSink>>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clipboard, then share, then a file in `output_dir`.
    pub fn system(output_dir: impl Into<PathBuf>) -> Self {
        Self::new()
            .with_sink(ClipboardSink::detect())
            .with_sink(ShareSink::detect())
            .with_sink(DownloadSink::new(output_dir))
    }

    /// Append a sink at the lowest priority.
    pub fn with_sink(mut self, sink: impl ExportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn sink_kinds(&self) -> Vec<SinkKind> {
        self.sinks.iter().map(|s| s.kind()).collect()
    }

    pub fn export(&self, png: &PngImage) -> Result<ExportOutcome, ExportError> {
        let mut fallthrough = Vec::new();

        for sink in &self.sinks {
            let kind = sink.kind();
            if !sink.is_available() {
                log::debug!("export: {kind} unavailable, skipping");
                fallthrough.push(SinkAttempt::Skipped(kind));
                continue;
            }

            match sink.deliver(png) {
                Ok(delivery) => {
                    log::info!("export: {delivery}");
                    return Ok(ExportOutcome {
                        sink: kind,
                        delivery,
                        fallthrough,
                    });
                }
                Err(e) => {
                    log::warn!("export: {kind} failed: {e}");
                    fallthrough.push(SinkAttempt::Failed {
                        kind,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(ExportError::Exhausted {
            attempts: fallthrough,
        })
    }
}

impl fmt::Debug for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exporter")
            .field("sinks", &self.sink_kinds())
            .finish()
    }
}

/// Fetch sprites for `view` and rasterize it.
pub async fn render_png<S>(
    view: &BoardView,
    source: &S,
    rasterizer: &Rasterizer,
) -> Result<PngImage, RasterError>
where
    S: EntitySource + ?Sized,
{
    let sprites = SpriteSheet::fetch(view, source).await;
    let png = rasterizer.rasterize(view, &sprites)?;
    log::debug!("rasterized board at {}x{}", png.width(), png.height());
    Ok(png)
}

/// Fetch sprites for `view`, rasterize it and run the export policy.
///
/// Sinks block on file writes and child processes; async callers that
/// cannot afford that should pair [`render_png`] with a blocking task.
pub async fn export_view<S>(
    view: &BoardView,
    source: &S,
    rasterizer: &Rasterizer,
    exporter: &Exporter,
) -> Result<ExportOutcome, ExportError>
where
    S: EntitySource + ?Sized,
{
    let png = render_png(view, source, rasterizer).await?;
    exporter.export(&png)
}

/// An external program to pipe or hand the image to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExternalCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalCommand {
    fn name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    fn check(&self, status: std::process::ExitStatus) -> Result<(), ExportError> {
        if status.success() {
            Ok(())
        } else {
            Err(ExportError::Command {
                program: self.name(),
                status: status.to_string(),
            })
        }
    }
}

/// Copies the PNG onto the system clipboard with `wl-copy` or `xclip`.
#[derive(Debug, Clone, Default)]
pub struct ClipboardSink {
    command: Option<ExternalCommand>,
}

impl ClipboardSink {
    /// Pick a clipboard tool for the running display server.
    pub fn detect() -> Self {
        let candidates: [(&str, &str, &[&str]); 2] = [
            ("WAYLAND_DISPLAY", "wl-copy", &["--type", "image/png"]),
            ("DISPLAY", "xclip", &["-selection", "clipboard", "-t", "image/png"]),
        ];

        let command = candidates.iter().find_map(|(display, program, args)| {
            env::var_os(display)?;
            which::which(program).ok().map(|program| ExternalCommand {
                program,
                args: args.iter().map(|a| a.to_string()).collect(),
            })
        });

        if let Some(command) = &command {
            log::debug!("clipboard: using {}", command.program.display());
        }
        Self { command }
    }

    /// Pipe into an explicit program instead of detecting one.
    pub fn with_command(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self {
            command: Some(ExternalCommand {
                program: program.into(),
                args: args.iter().map(|a| a.to_string()).collect(),
            }),
        }
    }
}

impl ExportSink for ClipboardSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Clipboard
    }

    fn is_available(&self) -> bool {
        self.command.is_some()
    }

    fn deliver(&self, png: &PngImage) -> Result<Delivery, ExportError> {
        let command = self
            .command
            .as_ref()
            .ok_or(ExportError::Unavailable(SinkKind::Clipboard))?;

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(png.bytes()),
            None => Ok(()),
        };
        // stdin is dropped; reap the child before reporting the write.
        let status = child.wait()?;
        written?;
        command.check(status)?;

        Ok(Delivery::Clipboard {
            program: command.name(),
        })
    }
}

/// Writes the PNG to a scratch file and opens it with the platform opener.
#[derive(Debug, Clone)]
pub struct ShareSink {
    opener: Option<ExternalCommand>,
    dir: PathBuf,
}

impl ShareSink {
    pub fn detect() -> Self {
        let graphical = cfg!(target_os = "macos")
            || env::var_os("DISPLAY").is_some()
            || env::var_os("WAYLAND_DISPLAY").is_some();
        let program = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };

        let opener = graphical
            .then(|| which::which(program).ok())
            .flatten()
            .map(|program| ExternalCommand {
                program,
                args: Vec::new(),
            });

        Self {
            opener,
            dir: env::temp_dir(),
        }
    }

    pub fn with_opener(program: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self {
            opener: Some(ExternalCommand {
                program: program.into(),
                args: Vec::new(),
            }),
            dir: dir.into(),
        }
    }
}

impl ExportSink for ShareSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Share
    }

    fn is_available(&self) -> bool {
        self.opener.is_some()
    }

    fn deliver(&self, png: &PngImage) -> Result<Delivery, ExportError> {
        let opener = self
            .opener
            .as_ref()
            .ok_or(ExportError::Unavailable(SinkKind::Share))?;

        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(DOWNLOAD_FILE_NAME);
        fs::write(&path, png.bytes())?;

        let status = Command::new(&opener.program)
            .args(&opener.args)
            .arg(&path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        opener.check(status)?;

        Ok(Delivery::Shared { path })
    }
}

/// Saves `pokemon-board.png` into a directory. Always available.
#[derive(Debug, Clone)]
pub struct DownloadSink {
    dir: PathBuf,
}

impl DownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(DOWNLOAD_FILE_NAME)
    }
}

impl ExportSink for DownloadSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Download
    }

    fn is_available(&self) -> bool {
        true
    }

    fn deliver(&self, png: &PngImage) -> Result<Delivery, ExportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path();
        fs::write(&path, png.bytes())?;
        Ok(Delivery::Saved { path })
    }
}
