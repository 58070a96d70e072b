//! Random Pokémon tier boards.
//!
//! This crate provides:
//! - A sampler that fills five capped tiers from random National Dex draws
//! - Score ladders mapping base stat totals to tiers
//! - A pure board layout shared by every front end
//! - PNG rasterization and a clipboard / share / download export policy
//!
//! # Quick Start
//!
//! ```ignore
//! use tierboard_core::{BoardConfig, TierBoard};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BoardConfig::from_env()?.with_seed(7);
//!     let mut board = TierBoard::from_config(config.client()?, &config)?;
//!
//!     let report = board.generate().await?;
//!     println!("{} placed in {} attempts", report.accepted(), report.attempts);
//!
//!     let outcome = board.export().await?;
//!     println!("{}", outcome.delivery);
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod config;
pub mod export;
pub mod raster;
pub mod sampler;
pub mod session;
pub mod source;
pub mod testing;
pub mod tier;
pub mod view;

// Primary public API
pub use board::{Board, BoardEntry, BoardState, Placement, TierBucket, TIER_CAPACITY};
pub use config::{BoardConfig, ConfigError};
pub use export::{
    export_view, render_png, ClipboardSink, Confirmation, Delivery, DownloadSink, ExportError,
    ExportOutcome, ExportSink, Exporter, ShareSink, SinkAttempt, SinkKind, DOWNLOAD_FILE_NAME,
};
pub use raster::{Palette, PngImage, RasterError, Rasterizer, SpriteSheet};
pub use sampler::{
    FetchFailurePolicy, GenerationReport, Progress, SampleError, Sampler, SamplerConfig,
    DEFAULT_ATTEMPT_BUDGET,
};
pub use session::{SessionError, TierBoard};
pub use source::{EntityRecord, EntitySource, FetchError, Stat};
pub use tier::{LadderKind, Tier, TierLadder};
pub use view::{BoardGeometry, BoardView, Card, PixelRect, TierRow};
