//! Minimal PokeAPI client.
//!
//! This crate provides a focused client for the two calls a tier board needs:
//! - Fetching a single Pokémon record by National Dex id
//! - Downloading the artwork a record points at
//!
//! Every request carries a timeout so a stalled connection surfaces as
//! [`Error::Timeout`] instead of hanging the caller.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://pokeapi.co/api/v2";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 5;
const USER_AGENT: &str = concat!("tierboard/", env!("CARGO_PKG_VERSION"));

/// Lowest National Dex id served by the `pokemon` endpoint.
pub const MIN_DEX_ID: u32 = 1;

/// Highest National Dex id in the contiguous main range.
pub const MAX_DEX_ID: u32 = 1025;

/// Errors that can occur when using the PokeAPI client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True for failures of the transport or the server, as opposed to a
    /// response that arrived but could not be understood.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Timeout(_) | Error::NotFound(_) | Error::Api { .. }
        )
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else if e.is_decode() {
            Error::Parse(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

/// PokeAPI client.
#[derive(Clone)]
pub struct PokeApi {
    client: reqwest::Client,
    base_url: String,
}

impl PokeApi {
    /// Create a client against the public API with the default timeout.
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: API_BASE.to_string(),
        })
    }

    /// Create a client honoring the `POKEAPI_BASE_URL` environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let client = Self::new()?;
        match std::env::var("POKEAPI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Ok(client.with_base_url(url)),
            _ => Ok(client),
        }
    }

    /// Point the client at a different API root (mirrors, local caches).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the `pokemon` resource for `id`.
    pub fn pokemon_url(&self, id: u32) -> String {
        format!("{}/pokemon/{id}", self.base_url)
    }

    /// Fetch a single Pokémon record.
    pub async fn pokemon(&self, id: u32) -> Result<Pokemon, Error> {
        let url = self.pokemon_url(id);
        log::trace!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await.map_err(Error::from_reqwest)?;
        parse_pokemon(&body)
    }

    /// Download raw image bytes from a sprite URL.
    pub async fn sprite(&self, url: &str) -> Result<Vec<u8>, Error> {
        log::trace!("GET {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("sprite download failed for {url}"),
            });
        }

        let bytes = response.bytes().await.map_err(Error::from_reqwest)?;
        Ok(bytes.to_vec())
    }
}

/// Parse a `pokemon` resource body.
pub fn parse_pokemon(body: &str) -> Result<Pokemon, Error> {
    let pokemon: Pokemon =
        serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;

    if pokemon.name.trim().is_empty() {
        return Err(Error::Parse("record has an empty name".to_string()));
    }
    if pokemon.stats.is_empty() {
        return Err(Error::Parse(format!("record '{}' has no stats", pokemon.name)));
    }
    if pokemon.base_stat_total().is_none() {
        return Err(Error::Parse(format!(
            "record '{}' has stats too large to total",
            pokemon.name
        )));
    }

    Ok(pokemon)
}

// ============================================================================
// Public types
// ============================================================================

/// A Pokémon record, reduced to the fields a tier board reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    pub stats: Vec<StatEntry>,
    #[serde(default)]
    pub sprites: Sprites,
}

impl Pokemon {
    /// Sum of all base stats ("base stat total"), or `None` if it
    /// overflows.
    pub fn base_stat_total(&self) -> Option<u32> {
        self.stats
            .iter()
            .try_fold(0u32, |total, s| total.checked_add(s.base_stat))
    }

    /// Base value of a named stat, e.g. `"speed"`.
    pub fn stat(&self, name: &str) -> Option<u32> {
        self.stats
            .iter()
            .find(|s| s.stat.name == name)
            .map(|s| s.base_stat)
    }

    /// Preferred artwork URL: official artwork, then the default sprite.
    pub fn artwork_url(&self) -> Option<&str> {
        self.sprites
            .other
            .as_ref()
            .and_then(|o| o.official_artwork.as_ref())
            .and_then(|a| a.front_default.as_deref())
            .or(self.sprites.front_default.as_deref())
    }
}

/// One entry of the `stats` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatEntry {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    #[serde(default)]
    pub stat: NamedResource,
}

/// A `{name, url}` reference to another resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedResource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: Option<Artwork>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artwork {
    #[serde(default)]
    pub front_default: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const GARCHOMP: &str = r#"{
        "id": 445,
        "name": "garchomp",
        "base_experience": 300,
        "stats": [
            {"base_stat": 108, "effort": 0, "stat": {"name": "hp", "url": ""}},
            {"base_stat": 130, "effort": 3, "stat": {"name": "attack", "url": ""}},
            {"base_stat": 95, "effort": 0, "stat": {"name": "defense", "url": ""}},
            {"base_stat": 80, "effort": 0, "stat": {"name": "special-attack", "url": ""}},
            {"base_stat": 85, "effort": 0, "stat": {"name": "special-defense", "url": ""}},
            {"base_stat": 102, "effort": 0, "stat": {"name": "speed", "url": ""}}
        ],
        "sprites": {
            "front_default": "https://img.example/sprites/445.png",
            "other": {
                "official-artwork": {"front_default": "https://img.example/artwork/445.png"},
                "home": {"front_default": null}
            }
        }
    }"#;

    #[test]
    fn test_client_creation() {
        let client = PokeApi::new().unwrap();
        assert_eq!(client.base_url(), API_BASE);
    }

    #[test]
    fn test_client_with_base_url() {
        let client = PokeApi::new().unwrap().with_base_url("http://localhost:8080/api/v2/");
        assert_eq!(client.base_url(), "http://localhost:8080/api/v2");
        assert_eq!(client.pokemon_url(25), "http://localhost:8080/api/v2/pokemon/25");
    }

    #[test]
    fn test_parse_pokemon() {
        let pokemon = parse_pokemon(GARCHOMP).unwrap();
        assert_eq!(pokemon.id, 445);
        assert_eq!(pokemon.name, "garchomp");
        assert_eq!(pokemon.base_stat_total(), Some(600));
        assert_eq!(pokemon.stat("speed"), Some(102));
        assert_eq!(pokemon.stat("luck"), None);
        assert_eq!(
            pokemon.artwork_url(),
            Some("https://img.example/artwork/445.png")
        );
    }

    #[test]
    fn test_artwork_falls_back_to_default_sprite() {
        let body = r#"{
            "id": 10001,
            "name": "deoxys-attack",
            "stats": [{"base_stat": 50, "stat": {"name": "hp"}}],
            "sprites": {
                "front_default": "https://img.example/sprites/10001.png",
                "other": {"official-artwork": {"front_default": null}}
            }
        }"#;
        let pokemon = parse_pokemon(body).unwrap();
        assert_eq!(
            pokemon.artwork_url(),
            Some("https://img.example/sprites/10001.png")
        );
    }

    #[test]
    fn test_missing_sprites_is_not_an_error() {
        let body = r#"{"id": 1, "name": "bulbasaur", "stats": [{"base_stat": 45}]}"#;
        let pokemon = parse_pokemon(body).unwrap();
        assert_eq!(pokemon.artwork_url(), None);
        assert_eq!(pokemon.base_stat_total(), Some(45));
    }

    #[test]
    fn test_malformed_records_are_parse_errors() {
        assert!(matches!(parse_pokemon("not json"), Err(Error::Parse(_))));
        assert!(matches!(
            parse_pokemon(r#"{"id": 1, "stats": []}"#),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse_pokemon(r#"{"id": 1, "name": "ditto", "stats": []}"#),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse_pokemon(r#"{"id": 1, "name": " ", "stats": [{"base_stat": 1}]}"#),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_overflowing_stat_total_is_a_parse_error() {
        let body = r#"{
            "id": 7,
            "name": "squirtle",
            "stats": [{"base_stat": 4294967295}, {"base_stat": 1}]
        }"#;
        assert!(matches!(parse_pokemon(body), Err(Error::Parse(_))));
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::Network("reset".into()).is_transport());
        assert!(Error::Timeout("10s".into()).is_transport());
        assert!(Error::NotFound("/pokemon/9999".into()).is_transport());
        assert!(Error::Api {
            status: 503,
            message: String::new()
        }
        .is_transport());
        assert!(!Error::Parse("eof".into()).is_transport());
        assert!(!Error::Config("bad".into()).is_transport());
    }
}
