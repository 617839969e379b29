//! Endpoint catalog
//!
//! Static knowledge about the three providers: SMARD bidding zones and chart
//! series ids, the BMRS and EirGrid series served here, and the URL builders
//! for one fetch unit of each.
//!
//! # URL shapes
//!
//! - SMARD: `{base}/chart_data/{id}/{region}/{id}_{region}_{resolution}_{ms}.json`
//! - BMRS: `{base}/{report}/v1?APIKey={key}&SettlementDate={YYYY-MM-DD}&Period=*&ServiceType=csv`
//! - EirGrid: `{base}/data?area={area}&region=ALL&datefrom={dd-Mon-YYYY}+00%3A00&dateto={dd-Mon-YYYY}+23%3A59`

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::MarketDataError;
use crate::resource::ResourceType;

// ============================================================================
// Bidding zones (day-ahead prices)
// ============================================================================

/// Bidding zone with a SMARD day-ahead price series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BiddingZone {
    /// Germany-Austria-Luxembourg, 2015-01-05 to 2018-09-30
    DeAtLu,
    /// Germany-Luxembourg, from 2018-10-01
    DeLu,
    /// Average of all neighbours of DE_LU, from 2019-11-20
    DeLuNeighbors,
    Be,
    /// Norway south-west
    No2,
    /// Austria, from 2018-10-01
    At,
    /// Denmark west
    Dk1,
    /// Denmark east
    Dk2,
    Fr,
    ItNorth,
    Nl,
    Pl,
    /// Sweden south
    Se4,
    Ch,
    Si,
    Cz,
    Hu,
}

impl BiddingZone {
    pub const ALL: [BiddingZone; 17] = [
        BiddingZone::DeAtLu,
        BiddingZone::DeLu,
        BiddingZone::DeLuNeighbors,
        BiddingZone::Be,
        BiddingZone::No2,
        BiddingZone::At,
        BiddingZone::Dk1,
        BiddingZone::Dk2,
        BiddingZone::Fr,
        BiddingZone::ItNorth,
        BiddingZone::Nl,
        BiddingZone::Pl,
        BiddingZone::Se4,
        BiddingZone::Ch,
        BiddingZone::Si,
        BiddingZone::Cz,
        BiddingZone::Hu,
    ];

    /// Zone name, also the column label of its price series
    pub fn name(&self) -> &'static str {
        match self {
            BiddingZone::DeAtLu => "DE_AT_LU",
            BiddingZone::DeLu => "DE_LU",
            BiddingZone::DeLuNeighbors => "DE_LU_NEIGHBORS",
            BiddingZone::Be => "BE",
            BiddingZone::No2 => "NO_2",
            BiddingZone::At => "AT",
            BiddingZone::Dk1 => "DK_1",
            BiddingZone::Dk2 => "DK_2",
            BiddingZone::Fr => "FR",
            BiddingZone::ItNorth => "IT_NORTH",
            BiddingZone::Nl => "NL",
            BiddingZone::Pl => "PL",
            BiddingZone::Se4 => "SE_4",
            BiddingZone::Ch => "CH",
            BiddingZone::Si => "SI",
            BiddingZone::Cz => "CZ",
            BiddingZone::Hu => "HU",
        }
    }

    /// SMARD chart series id
    pub fn api_id(&self) -> u32 {
        match self {
            BiddingZone::DeAtLu => 251,
            BiddingZone::DeLu => 4169,
            BiddingZone::DeLuNeighbors => 5078,
            BiddingZone::Be => 4996,
            BiddingZone::No2 => 4997,
            BiddingZone::At => 4170,
            BiddingZone::Dk1 => 252,
            BiddingZone::Dk2 => 253,
            BiddingZone::Fr => 254,
            BiddingZone::ItNorth => 255,
            BiddingZone::Nl => 256,
            BiddingZone::Pl => 257,
            BiddingZone::Se4 => 258,
            BiddingZone::Ch => 259,
            BiddingZone::Si => 260,
            BiddingZone::Cz => 261,
            BiddingZone::Hu => 262,
        }
    }

    /// First day with published prices, if restricted
    pub fn available_from(&self) -> Option<NaiveDate> {
        match self {
            BiddingZone::DeAtLu => NaiveDate::from_ymd_opt(2015, 1, 5),
            BiddingZone::DeLu | BiddingZone::At => NaiveDate::from_ymd_opt(2018, 10, 1),
            BiddingZone::DeLuNeighbors => NaiveDate::from_ymd_opt(2019, 11, 20),
            _ => None,
        }
    }

    /// Last day with published prices, if restricted
    pub fn available_until(&self) -> Option<NaiveDate> {
        match self {
            BiddingZone::DeAtLu => NaiveDate::from_ymd_opt(2018, 9, 30),
            _ => None,
        }
    }

    /// Whether `[first, last]` lies within the zone's availability
    pub fn covers(&self, first: NaiveDate, last: NaiveDate) -> bool {
        self.available_from().map_or(true, |from| first >= from)
            && self.available_until().map_or(true, |until| last <= until)
    }
}

impl fmt::Display for BiddingZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BiddingZone {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BiddingZone::ALL
            .iter()
            .find(|zone| zone.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| MarketDataError::Config(format!("Unknown bidding zone: '{}'", s)))
    }
}

// ============================================================================
// SMARD generation series
// ============================================================================

/// Whether a series is generation or consumption of its resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesKind {
    ActualAggregated,
    ActualConsumption,
}

impl SeriesKind {
    pub fn name(&self) -> &'static str {
        match self {
            SeriesKind::ActualAggregated => "Actual Aggregated",
            SeriesKind::ActualConsumption => "Actual Consumption",
        }
    }

    /// Sign applied when folding into net generation
    pub fn net_sign(&self) -> f64 {
        match self {
            SeriesKind::ActualAggregated => 1.0,
            SeriesKind::ActualConsumption => -1.0,
        }
    }
}

/// Column label of a SMARD per-type series: `(resource, kind)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesLabel {
    pub resource: ResourceType,
    pub kind: SeriesKind,
}

impl fmt::Display for SeriesLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.resource, self.kind.name())
    }
}

/// SMARD chart series of one resource type
#[derive(Debug, Clone, PartialEq)]
pub struct SmardSeries {
    pub resource: ResourceType,
    pub kind: SeriesKind,
    pub id: u32,
}

impl SmardSeries {
    pub fn label(&self) -> SeriesLabel {
        SeriesLabel {
            resource: self.resource.clone(),
            kind: self.kind,
        }
    }
}

const fn aggregated(resource: ResourceType, id: u32) -> SmardSeries {
    SmardSeries {
        resource,
        kind: SeriesKind::ActualAggregated,
        id,
    }
}

/// German per-type generation series (quarter-hour energy)
pub static SMARD_GENERATION_SERIES: [SmardSeries; 17] = [
    aggregated(ResourceType::Biomass, 4066),
    aggregated(ResourceType::FossilBrownCoalLignite, 1223),
    aggregated(ResourceType::FossilGas, 4071),
    aggregated(ResourceType::FossilHardCoal, 4069),
    aggregated(ResourceType::FossilOil, 115),
    aggregated(ResourceType::Geothermal, 105),
    aggregated(ResourceType::HydroPumpedStorage, 4070),
    SmardSeries {
        resource: ResourceType::HydroPumpedStorage,
        kind: SeriesKind::ActualConsumption,
        id: 4387,
    },
    aggregated(ResourceType::HydroRunOfRiver, 104),
    aggregated(ResourceType::HydroWaterReservoir, 118),
    aggregated(ResourceType::Nuclear, 1224),
    aggregated(ResourceType::Other, 119),
    aggregated(ResourceType::OtherRenewable, 107),
    aggregated(ResourceType::Solar, 4068),
    aggregated(ResourceType::Waste, 120),
    aggregated(ResourceType::WindOffshore, 1225),
    aggregated(ResourceType::WindOnshore, 4067),
];

/// German realized consumption series
pub const SMARD_DEMAND_SERIES: u32 = 410;

/// Region segment of national SMARD series
pub const SMARD_NATIONAL_REGION: &str = "DE";

/// Column label of demand series
pub const ACTUAL_LOAD: &str = "Actual Load";

/// Time resolution segment of a SMARD chart file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Hour,
    QuarterHour,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Hour => "hour",
            Resolution::QuarterHour => "quarterhour",
        }
    }

    /// Factor turning one slot of energy (MWh) into average power (MW)
    pub fn energy_to_power(&self) -> f64 {
        match self {
            Resolution::Hour => 1.0,
            Resolution::QuarterHour => 4.0,
        }
    }
}

/// URL of one weekly SMARD chart file
///
/// # Examples
///
/// ```
/// # use grid_market_data::catalog::{smard_chart_url, Resolution};
/// assert_eq!(
///     smard_chart_url("https://www.smard.de/app", 410, "DE", Resolution::QuarterHour, 1694988000000),
///     "https://www.smard.de/app/chart_data/410/DE/410_DE_quarterhour_1694988000000.json"
/// );
/// ```
pub fn smard_chart_url(
    base_url: &str,
    series_id: impl fmt::Display,
    region: &str,
    resolution: Resolution,
    week_millis: i64,
) -> String {
    format!(
        "{base}/chart_data/{id}/{region}/{id}_{region}_{res}_{ms}.json",
        base = base_url.trim_end_matches('/'),
        id = series_id,
        region = region,
        res = resolution.as_str(),
        ms = week_millis
    )
}

/// SMARD UI translation table (German)
pub fn smard_translations_url(base_url: &str) -> String {
    format!("{}/assets/translations/lang-de.json", base_url.trim_end_matches('/'))
}

/// SMARD power plant metadata
pub fn smard_power_plant_metadata_url(base_url: &str) -> String {
    format!(
        "{}/power_plant_data/power_plant_metadata.json",
        base_url.trim_end_matches('/')
    )
}

// ============================================================================
// BMRS (Great Britain)
// ============================================================================

/// BMRS report codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmrsReport {
    /// Actual generation output per generation type
    B1620,
    /// Actual total load
    B0610,
}

impl BmrsReport {
    pub fn code(&self) -> &'static str {
        match self {
            BmrsReport::B1620 => "B1620",
            BmrsReport::B0610 => "B0610",
        }
    }
}

/// Resource types reported by B1620, in output column order
pub static GB_GENERATION_TYPES: [ResourceType; 11] = [
    ResourceType::Biomass,
    ResourceType::HydroPumpedStorage,
    ResourceType::HydroRunOfRiver,
    ResourceType::FossilHardCoal,
    ResourceType::FossilGas,
    ResourceType::FossilOil,
    ResourceType::Nuclear,
    ResourceType::Other,
    ResourceType::WindOnshore,
    ResourceType::WindOffshore,
    ResourceType::Solar,
];

/// URL of one settlement day of a BMRS report
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use grid_market_data::catalog::{bmrs_report_url, BmrsReport};
/// let day = NaiveDate::from_ymd_opt(2023, 9, 18).unwrap();
/// assert_eq!(
///     bmrs_report_url("https://api.bmreports.com/BMRS", BmrsReport::B0610, "KEY", day),
///     "https://api.bmreports.com/BMRS/B0610/v1?APIKey=KEY&SettlementDate=2023-09-18&Period=*&ServiceType=csv"
/// );
/// ```
pub fn bmrs_report_url(base_url: &str, report: BmrsReport, api_key: &str, day: NaiveDate) -> String {
    format!(
        "{}/{}/v1?APIKey={}&SettlementDate={}&Period=*&ServiceType=csv",
        base_url.trim_end_matches('/'),
        report.code(),
        api_key,
        day.format("%Y-%m-%d")
    )
}

// ============================================================================
// EirGrid (Ireland)
// ============================================================================

/// Smart Grid Dashboard data areas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EirGridArea {
    WindActual,
    GenerationActual,
    DemandActual,
    Interconnection,
}

impl EirGridArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            EirGridArea::WindActual => "windactual",
            EirGridArea::GenerationActual => "generationactual",
            EirGridArea::DemandActual => "demandactual",
            EirGridArea::Interconnection => "interconnection",
        }
    }
}

/// Shares of the non-wind remainder of all-island generation
pub static IE_GENERATION_SHARES: [(ResourceType, f64); 7] = [
    (ResourceType::FossilHardCoal, 0.133803),
    (ResourceType::FossilGas, 0.715493),
    (ResourceType::FossilOil, 0.012676),
    (ResourceType::HydroRunOfRiver, 0.023944),
    (ResourceType::Biomass, 0.023944),
    (ResourceType::HydroPumpedStorage, 0.008451),
    (ResourceType::Other, 0.081690),
];

/// Interconnector field names in the `interconnection` area
pub const IE_INTERCONNECTORS: [&str; 2] = ["INTER_EWIC", "INTER_MOYLE"];

/// Flow column labels
pub const GB_TO_IE: &str = "GB > IE";
pub const IE_TO_GB: &str = "IE > GB";

/// URL of one day of a Smart Grid Dashboard area
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use grid_market_data::catalog::{eirgrid_area_url, EirGridArea};
/// let day = NaiveDate::from_ymd_opt(2023, 9, 18).unwrap();
/// assert_eq!(
///     eirgrid_area_url("https://www.smartgriddashboard.com/DashboardService.svc", EirGridArea::DemandActual, day),
///     "https://www.smartgriddashboard.com/DashboardService.svc/data?area=demandactual&region=ALL&datefrom=18-Sep-2023+00%3A00&dateto=18-Sep-2023+23%3A59"
/// );
/// ```
pub fn eirgrid_area_url(base_url: &str, area: EirGridArea, day: NaiveDate) -> String {
    let date = day.format("%d-%b-%Y");
    format!(
        "{}/data?area={}&region=ALL&datefrom={}+00%3A00&dateto={}+23%3A59",
        base_url.trim_end_matches('/'),
        area.as_str(),
        date,
        date
    )
}
