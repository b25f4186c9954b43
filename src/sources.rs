//! Where each city's trip data lives.
//!
//! The three supported cities have built-in defaults. A TOML (or JSON) file can override the
//! data root, the raw-data batch size, or replace and add city entries:
//!
//! ```toml
//! data_root = "/srv/bikeshare"
//! raw_batch_size = 10
//!
//! [[cities]]
//! name = "chicago"
//! file_name = "chicago_2017.csv.gz"
//! ```

use crate::error::TripError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ordered list of the built-in cities
pub const ALL_CITIES: &[&str] = &["chicago", "new york", "washington dc"];

pub const DEFAULT_DATA_ROOT: &str = ".";

/// Raw rows shown per page unless configured otherwise.
pub const DEFAULT_RAW_BATCH_SIZE: usize = 5;

/// Maps an opaque source identifier to a readable file.
pub trait SourceResolver {
    fn resolve(&self, source_id: &str) -> Result<PathBuf, TripError>;
}

/// One city's trip file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySource {
    /// Lowercase city name users type, e.g. "new york"
    pub name: String,

    /// File name relative to the data root, or an absolute path
    pub file_name: String,

    /// Other names accepted for this city
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CitySource {
    fn new(name: &str, file_name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            file_name: file_name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn answers_to(&self, id: &str) -> bool {
        self.name.eq_ignore_ascii_case(id) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(id))
    }
}

/// Configuration structure for TOML/JSON override file
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SourceConfig {
    pub data_root: Option<String>,
    pub raw_batch_size: Option<usize>,
    pub cities: Option<Vec<CitySource>>,
}

impl SourceConfig {
    /// Load configuration from a file path (TOML or JSON based on extension)
    pub fn load_from_file(path: &Path) -> Result<Self, TripError> {
        let content = std::fs::read_to_string(path).map_err(TripError::IoError)?;

        if path.extension().map_or(false, |ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| TripError::ParsingError(format!("Invalid JSON config: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| TripError::ParsingError(format!("Invalid TOML config: {}", e)))
        }
    }
}

/// Registry of city sources, with optional config override
#[derive(Debug, Clone)]
pub struct CityRegistry {
    pub cities: HashMap<String, CitySource>,
    pub data_root: PathBuf,
    pub raw_batch_size: usize,
}

impl Default for CityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CityRegistry {
    /// Create with defaults only
    pub fn new() -> Self {
        let cities = default_city_sources()
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        Self {
            cities,
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            raw_batch_size: DEFAULT_RAW_BATCH_SIZE,
        }
    }

    /// Create with optional config file override
    pub fn with_config(config_path: Option<&Path>) -> Result<Self, TripError> {
        let mut registry = Self::new();

        if let Some(path) = config_path {
            let config = SourceConfig::load_from_file(path)?;

            if let Some(root) = config.data_root {
                registry.data_root = PathBuf::from(root);
            }

            if let Some(size) = config.raw_batch_size {
                if size == 0 {
                    return Err(TripError::InvalidBatchSize(size));
                }
                registry.raw_batch_size = size;
            }

            if let Some(cities) = config.cities {
                for city in cities {
                    let key = city.name.to_lowercase();
                    registry.cities.insert(key, city);
                }
            }
        }

        Ok(registry)
    }

    pub fn with_data_root<P: Into<PathBuf>>(mut self, data_root: P) -> Self {
        self.data_root = data_root.into();
        self
    }

    /// Find a city by name or alias, ignoring case and surrounding whitespace.
    pub fn get_city(&self, id: &str) -> Option<&CitySource> {
        let id = id.trim();
        self.cities
            .get(&id.to_lowercase())
            .or_else(|| self.cities.values().find(|c| c.answers_to(id)))
    }

    /// Get all cities, built-in ones first in standard order, then any extras by name.
    pub fn all_cities(&self) -> Vec<&CitySource> {
        let mut cities: Vec<&CitySource> = ALL_CITIES
            .iter()
            .filter_map(|name| self.cities.get(*name))
            .collect();
        let mut extras: Vec<&CitySource> = self
            .cities
            .values()
            .filter(|c| !ALL_CITIES.contains(&c.name.to_lowercase().as_str()))
            .collect();
        extras.sort_by(|a, b| a.name.cmp(&b.name));
        cities.extend(extras);
        cities
    }

    /// Path a city's file would have, whether or not it exists.
    pub fn path_for(&self, city: &CitySource) -> PathBuf {
        self.data_root.join(&city.file_name)
    }
}

impl SourceResolver for CityRegistry {
    fn resolve(&self, source_id: &str) -> Result<PathBuf, TripError> {
        let city = self
            .get_city(source_id)
            .ok_or_else(|| TripError::SourceNotFound(format!("city '{}'", source_id.trim())))?;
        let path = self.path_for(city);
        debug!(city = %city.name, path = %path.display(), "resolving city");
        if !path.is_file() {
            return Err(TripError::SourceNotFound(format!(
                "city '{}' (expected file '{}')",
                city.name,
                path.display()
            )));
        }
        Ok(path)
    }
}

/// Get the default city sources
pub fn default_city_sources() -> Vec<CitySource> {
    vec![
        CitySource::new("chicago", "chicago.csv", &[]),
        CitySource::new("new york", "new_york_city.csv", &["new york city", "nyc"]),
        CitySource::new("washington dc", "washington.csv", &["washington"]),
    ]
}
