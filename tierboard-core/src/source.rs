//! Where entity records come from.
//!
//! The sampler only ever sees [`EntitySource`]; the live PokeAPI client and
//! the scripted [`MockSource`](crate::testing::MockSource) both sit behind it.

use async_trait::async_trait;
use pokeapi::{PokeApi, Pokemon};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Why a single fetch produced no usable record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request failed, timed out, or the service answered non-OK.
    #[error("network failure: {0}")]
    Network(String),

    /// A response arrived but lacked the fields a record needs.
    #[error("malformed record: {0}")]
    Malformed(String),
}

impl From<pokeapi::Error> for FetchError {
    fn from(error: pokeapi::Error) -> Self {
        if error.is_transport() {
            FetchError::Network(error.to_string())
        } else {
            FetchError::Malformed(error.to_string())
        }
    }
}

/// A named numeric attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub name: String,
    pub value: u32,
}

/// An external entity as the sampler sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u32,
    pub name: String,
    pub stats: Vec<Stat>,
    pub sprite: Option<String>,
}

impl EntityRecord {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            stats: Vec::new(),
            sprite: None,
        }
    }

    pub fn with_stat(mut self, name: impl Into<String>, value: u32) -> Self {
        self.stats.push(Stat {
            name: name.into(),
            value,
        });
        self
    }

    pub fn with_sprite(mut self, url: impl Into<String>) -> Self {
        self.sprite = Some(url.into());
        self
    }

    /// Strength score: the sum of every stat value, `None` on overflow.
    pub fn strength(&self) -> Option<u32> {
        self.stats
            .iter()
            .try_fold(0u32, |total, s| total.checked_add(s.value))
    }

    /// Strength score, with an overflowing total reported as malformed.
    pub fn score(&self) -> Result<u32, FetchError> {
        self.strength().ok_or_else(|| {
            FetchError::Malformed(format!("stats of '{}' overflow the score", self.name))
        })
    }
}

impl From<Pokemon> for EntityRecord {
    fn from(pokemon: Pokemon) -> Self {
        let sprite = pokemon.artwork_url().map(str::to_string);
        Self {
            id: pokemon.id,
            name: pokemon.name,
            stats: pokemon
                .stats
                .into_iter()
                .map(|s| Stat {
                    name: s.stat.name,
                    value: s.base_stat,
                })
                .collect(),
            sprite,
        }
    }
}

/// A service that can look up entity records and their artwork.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Fetch the record for `id`.
    async fn fetch(&self, id: u32) -> Result<EntityRecord, FetchError>;

    /// Download the image behind a record's sprite reference.
    async fn fetch_sprite(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl EntitySource for PokeApi {
    async fn fetch(&self, id: u32) -> Result<EntityRecord, FetchError> {
        let pokemon = self.pokemon(id).await?;
        Ok(pokemon.into())
    }

    async fn fetch_sprite(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(self.sprite(url).await?)
    }
}

#[async_trait]
impl<T: EntitySource + ?Sized> EntitySource for Arc<T> {
    async fn fetch(&self, id: u32) -> Result<EntityRecord, FetchError> {
        (**self).fetch(id).await
    }

    async fn fetch_sprite(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_sprite(url).await
    }
}
