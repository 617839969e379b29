//! SMARD power plant registry
//!
//! Per-unit generation needs to know which generating units exist, where
//! their series live (API id + control area) and in which years they ran.
//! SMARD publishes this as a metadata document whose names are keys into the
//! UI translation table. The registry is built from both documents, merged
//! by API id and cached as CSV next to the caller:
//!
//! ```text
//! BNA,EIC,SEE,Power Plant Name,Block Name,Company,City,Postal Code,Address,Latitude,Longitude,Type,Capacity,Control Area,API ID,Commissioning,Decommissioning
//! BNA0123,11WD7BOXB1-00-X,,Boxberg,Block N,LEAG,Boxberg,02943,...,51.41,14.56,Fossil Brown coal/Lignite,465.0,50Hertz,22736,1979,inf
//! ```
//!
//! The registry is a plain value: load it once, refresh it when stale, and
//! pass it by reference to [`crate::smard::SmardClient::per_unit_generation`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::catalog::{smard_power_plant_metadata_url, smard_translations_url};
use crate::config::Config;
use crate::error::{ParseError, Result};
use crate::http::HttpFetcher;
use crate::resource::ResourceType;

// ============================================================================
// Year bounds
// ============================================================================

/// Commissioning or decommissioning year, unbounded when unknown
///
/// Unknown commissioning is [`YearBound::NegInfinity`] (always built), unknown
/// decommissioning is [`YearBound::Infinity`] (still running). Persisted as
/// `-inf`, `inf` or the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum YearBound {
    NegInfinity,
    Year(i32),
    Infinity,
}

impl fmt::Display for YearBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearBound::NegInfinity => f.write_str("-inf"),
            YearBound::Year(year) => write!(f, "{}", year),
            YearBound::Infinity => f.write_str("inf"),
        }
    }
}

impl FromStr for YearBound {
    type Err = ParseError;

    /// Accepts `-inf`, `inf`, whole years and whole floats such as `2004.0`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "-inf" => return Ok(YearBound::NegInfinity),
            "inf" | "+inf" => return Ok(YearBound::Infinity),
            _ => {}
        }

        if let Ok(year) = trimmed.parse::<i32>() {
            return Ok(YearBound::Year(year));
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.fract() == 0.0 && v.abs() < f64::from(i32::MAX) => {
                Ok(YearBound::Year(v as i32))
            }
            _ => Err(ParseError::InvalidDecimal(s.to_string())),
        }
    }
}

impl TryFrom<String> for YearBound {
    type Error = ParseError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<YearBound> for String {
    fn from(bound: YearBound) -> Self {
        bound.to_string()
    }
}

// ============================================================================
// Records
// ============================================================================

/// One generating unit (merged by API id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerPlantRecord {
    /// Federal Network Agency block number
    #[serde(rename = "BNA")]
    pub bna: String,
    #[serde(rename = "EIC")]
    pub eic: String,
    /// Block id if it is a SEE number, empty otherwise
    #[serde(rename = "SEE")]
    pub see: String,
    #[serde(rename = "Power Plant Name")]
    pub plant_name: String,
    #[serde(rename = "Block Name")]
    pub block_name: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Postal Code")]
    pub postal_code: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(rename = "Type")]
    pub resource: ResourceType,
    /// Net capacity in MW
    #[serde(rename = "Capacity")]
    pub capacity: f64,
    /// TSO control area, also the region segment of the unit's series URL
    #[serde(rename = "Control Area")]
    pub control_area: String,
    /// SMARD production series id
    #[serde(rename = "API ID")]
    pub api_id: String,
    #[serde(rename = "Commissioning")]
    pub commissioning: YearBound,
    #[serde(rename = "Decommissioning")]
    pub decommissioning: YearBound,
}

impl PowerPlantRecord {
    /// Whether the unit may have produced in `year`
    ///
    /// Units commissioned in the following year are included.
    pub fn active_in_year(&self, year: i32) -> bool {
        self.commissioning <= YearBound::Year(year + 1)
            && self.decommissioning >= YearBound::Year(year)
    }

    pub fn label(&self) -> UnitLabel {
        UnitLabel {
            plant_name: self.plant_name.clone(),
            resource: self.resource.clone(),
            block_name: self.block_name.clone(),
            eic: self.eic.clone(),
            control_area: self.control_area.clone(),
        }
    }
}

/// Column label of a per-unit generation series
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitLabel {
    pub plant_name: String,
    pub resource: ResourceType,
    pub block_name: String,
    pub eic: String,
    pub control_area: String,
}

impl fmt::Display for UnitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} | {}",
            self.plant_name, self.resource, self.block_name, self.eic, self.control_area
        )
    }
}

// ============================================================================
// SMARD metadata documents
// ============================================================================

#[derive(Debug, Deserialize)]
struct PlantMetadata {
    plants: Vec<PlantEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlantEntry {
    #[serde(default)]
    name: Value,
    #[serde(default)]
    city: Value,
    #[serde(default)]
    resource: Value,
    #[serde(default)]
    company: Value,
    #[serde(default)]
    postal_code: Value,
    #[serde(default)]
    address: Value,
    #[serde(default)]
    coordinates: Vec<Value>,
    #[serde(default)]
    region_id: Value,
    #[serde(default)]
    blocks: Vec<BlockEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockEntry {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: Value,
    #[serde(default)]
    production_id: Value,
    #[serde(default)]
    block_number: Value,
    #[serde(default)]
    block_code: Value,
    #[serde(default)]
    commissioning: Value,
    #[serde(default)]
    status: Value,
    #[serde(default)]
    power: Value,
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// UI translation table: key -> German text
#[derive(Debug, Clone, Default)]
pub struct Translations(HashMap<String, String>);

impl Translations {
    /// Parse `lang-de.json` (a flat object of translation keys)
    pub fn parse(body: &str) -> std::result::Result<Self, ParseError> {
        let map: serde_json::Map<String, Value> = serde_json::from_str(body)
            .map_err(|e| ParseError::Json(format!("Failed to parse SMARD translations: {}", e)))?;
        Ok(Self(map.iter().map(|(k, v)| (k.clone(), text(v))).collect()))
    }

    /// Translated text of `key`, empty when there is none
    pub fn lookup(&self, key: &Value) -> String {
        match key {
            Value::String(k) => self.0.get(k).cloned().unwrap_or_default(),
            _ => String::new(),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("([0-9]{4})").expect("year pattern is valid"));

/// Sort key of an API id: numeric ids in numeric order, others after them
fn api_id_key(api_id: &str) -> (u64, String) {
    (api_id.trim().parse().unwrap_or(u64::MAX), api_id.to_string())
}

/// All known generating units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerPlantRegistry {
    records: Vec<PowerPlantRecord>,
}

impl PowerPlantRegistry {
    pub fn new(records: Vec<PowerPlantRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PowerPlantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Units that may have produced in `year`
    pub fn active_in_year(&self, year: i32) -> impl Iterator<Item = &PowerPlantRecord> {
        self.records.iter().filter(move |r| r.active_in_year(year))
    }

    /// Build the registry from the metadata document and translation table
    ///
    /// Blocks without a production id have no series and are skipped. Blocks
    /// sharing a production id are merged: the first block's fields win and
    /// capacities are summed. Records are ordered numerically by API id.
    pub fn from_metadata(
        metadata: &str,
        translations: &Translations,
    ) -> std::result::Result<Self, ParseError> {
        let document: PlantMetadata = serde_json::from_str(metadata)
            .map_err(|e| ParseError::Json(format!("Failed to parse power plant metadata: {}", e)))?;
        let first_year = |s: &str| {
            YEAR.captures(s)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<i32>().ok())
        };

        let mut merged: BTreeMap<(u64, String), PowerPlantRecord> = BTreeMap::new();

        for plant in &document.plants {
            for block in &plant.blocks {
                if block.production_id.is_null() {
                    continue;
                }

                let block_id = text(&block.id);
                let see = if block_id.contains("SEE") {
                    block_id
                } else {
                    String::new()
                };

                let commissioning = match &block.commissioning {
                    Value::Number(n) => n
                        .as_i64()
                        .and_then(|y| i32::try_from(y).ok())
                        .map_or(YearBound::NegInfinity, YearBound::Year),
                    other => first_year(&text(other)).map_or(YearBound::NegInfinity, YearBound::Year),
                };
                let decommissioning =
                    first_year(&text(&block.status)).map_or(YearBound::Infinity, YearBound::Year);

                let record = PowerPlantRecord {
                    bna: text(&block.block_number),
                    eic: text(&block.block_code),
                    see,
                    plant_name: translations.lookup(&plant.name),
                    block_name: translations.lookup(&block.name),
                    company: text(&plant.company),
                    city: translations.lookup(&plant.city),
                    postal_code: text(&plant.postal_code),
                    address: text(&plant.address),
                    latitude: plant.coordinates.first().and_then(number),
                    longitude: plant.coordinates.get(1).and_then(number),
                    resource: ResourceType::from_smard(&text(&plant.resource)),
                    capacity: number(&block.power).unwrap_or(0.0),
                    control_area: text(&plant.region_id),
                    api_id: text(&block.production_id),
                    commissioning,
                    decommissioning,
                };

                let capacity = record.capacity;
                merged
                    .entry(api_id_key(&record.api_id))
                    .and_modify(|existing| existing.capacity += capacity)
                    .or_insert(record);
            }
        }

        Ok(Self::new(merged.into_values().collect()))
    }

    /// Download translations and metadata and build a fresh registry
    ///
    /// Returns `Ok(None)` when either document is unavailable; an existing
    /// cached list stays in use in that case.
    pub fn refresh(fetcher: &HttpFetcher, smard_base_url: &str) -> Result<Option<Self>> {
        let Some(lang) = fetcher.get_text(&smard_translations_url(smard_base_url))? else {
            warn!("SMARD translations unavailable, power plant list not refreshed");
            return Ok(None);
        };
        let translations = Translations::parse(&lang)?;

        let Some(metadata) = fetcher.get_text(&smard_power_plant_metadata_url(smard_base_url))?
        else {
            warn!("SMARD power plant metadata unavailable, power plant list not refreshed");
            return Ok(None);
        };

        let registry = Self::from_metadata(&metadata, &translations)?;
        info!("Built power plant list with {} units", registry.len());
        Ok(Some(registry))
    }

    /// Read a cached CSV list
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(File::open(path.as_ref())?);
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<PowerPlantRecord>, csv::Error>>()?;
        Ok(Self::new(records))
    }

    /// Write the list as CSV
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_writer(File::create(path.as_ref())?);
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Whether the cached list at `path` is missing or older than `max_age`
    pub fn is_stale(path: impl AsRef<Path>, max_age: Duration) -> bool {
        let modified = match std::fs::metadata(path.as_ref()).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return true,
        };
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age >= max_age
    }

    /// Refresh the cached list if stale, then load it
    pub fn load_or_refresh(fetcher: &HttpFetcher, config: &Config) -> Result<Self> {
        let path = &config.power_plant_list_path;

        if Self::is_stale(path, config.power_plant_list_max_age()) {
            info!("Power plant list {} is stale, refreshing", path.display());
            if let Some(registry) = Self::refresh(fetcher, &config.smard_base_url)? {
                registry.save(path)?;
                return Ok(registry);
            }
        }

        Self::load(path)
    }
}
