//! Test doubles for the tier board.
//!
//! This module provides tools for deterministic testing without network or
//! display access:
//! - `MockSource` for scripted records, failures and sprite bytes
//! - `RecordingSink` for scripted export capabilities
//! - `sample_png` for a tiny ready-made image

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::export::{Delivery, ExportError, ExportSink, SinkKind};
use crate::raster::PngImage;
use crate::source::{EntityRecord, EntitySource, FetchError};

#[derive(Debug, Clone)]
enum Scripted {
    Record(EntityRecord),
    Fail(FetchError),
}

/// An [`EntitySource`] that answers from a script.
///
/// Ids with nothing scripted fail as network errors.
#[derive(Debug, Default)]
pub struct MockSource {
    records: HashMap<u32, Scripted>,
    sprites: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
    sprite_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// One record per id in `ids`, named `mon-<id>`, with a single stat
    /// worth `score(id)`.
    pub fn tiered(ids: RangeInclusive<u32>, score: impl Fn(u32) -> u32) -> Self {
        ids.fold(Self::new(), |source, id| {
            source.with_record(
                EntityRecord::new(id, format!("mon-{id}"))
                    .with_stat("total", score(id))
                    .with_sprite(format!("https://img.example/{id}.png")),
            )
        })
    }

    /// Script a record, keyed by its id.
    pub fn with_record(mut self, record: EntityRecord) -> Self {
        self.records.insert(record.id, Scripted::Record(record));
        self
    }

    /// Make `id` fail with a network error.
    pub fn failing(mut self, id: u32) -> Self {
        self.records.insert(
            id,
            Scripted::Fail(FetchError::Network(format!("scripted outage for id {id}"))),
        );
        self
    }

    /// Make `id` answer with a record that cannot be used.
    pub fn malformed(mut self, id: u32) -> Self {
        self.records.insert(
            id,
            Scripted::Fail(FetchError::Malformed(format!("scripted bad record for id {id}"))),
        );
        self
    }

    /// Serve `bytes` for the sprite at `url`.
    pub fn with_sprite(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.sprites.insert(url.into(), bytes);
        self
    }

    /// Number of record fetches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sprite_calls(&self) -> usize {
        self.sprite_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntitySource for MockSource {
    async fn fetch(&self, id: u32) -> Result<EntityRecord, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.records.get(&id) {
            Some(Scripted::Record(record)) => Ok(record.clone()),
            Some(Scripted::Fail(error)) => Err(error.clone()),
            None => Err(FetchError::Network(format!("no record scripted for id {id}"))),
        }
    }

    async fn fetch_sprite(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.sprite_calls.fetch_add(1, Ordering::SeqCst);
        self.sprites
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Network(format!("no sprite scripted for {url}")))
    }
}

/// Shared record of which sinks had `deliver` called, in order.
#[derive(Debug, Clone, Default)]
pub struct DeliveryLog(Arc<Mutex<Vec<SinkKind>>>);

impl DeliveryLog {
    pub fn calls(&self) -> Vec<SinkKind> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, kind: SinkKind) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(kind);
    }
}

/// An [`ExportSink`] with scripted availability that logs every delivery.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    kind: SinkKind,
    available: bool,
    fails: bool,
    log: DeliveryLog,
}

impl RecordingSink {
    pub fn new(kind: SinkKind, log: &DeliveryLog) -> Self {
        Self {
            kind,
            available: true,
            fails: false,
            log: log.clone(),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fails = true;
        self
    }
}

impl ExportSink for RecordingSink {
    fn kind(&self) -> SinkKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn deliver(&self, _png: &PngImage) -> Result<Delivery, ExportError> {
        self.log.push(self.kind);

        if self.fails {
            return Err(ExportError::Command {
                program: format!("recording-{}", self.kind),
                status: "exit status: 1".to_string(),
            });
        }

        Ok(match self.kind {
            SinkKind::Clipboard => Delivery::Clipboard {
                program: "recording".to_string(),
            },
            SinkKind::Share => Delivery::Shared {
                path: PathBuf::from("/recorded/share.png"),
            },
            SinkKind::Download => Delivery::Saved {
                path: PathBuf::from("/recorded/pokemon-board.png"),
            },
        })
    }
}

/// A 4x4 solid PNG.
pub fn sample_png() -> PngImage {
    PngImage::encode(&RgbaImage::from_pixel(4, 4, Rgba([200, 40, 40, 255])))
        .expect("a 4x4 RGBA image always encodes")
}

/// PNG bytes for a solid `width` x `height` sprite.
pub fn sprite_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    PngImage::encode(&RgbaImage::from_pixel(width, height, Rgba(color)))
        .map(|png| png.bytes().to_vec())
        .expect("an in-memory RGBA image always encodes")
}
