//! Irish market data from the EirGrid Smart Grid Dashboard
//!
//! The dashboard covers the whole island (Republic of Ireland and Northern
//! Ireland). Each area is requested per calendar day (Europe/Dublin) and comes
//! back as a flat list of quarter-hour rows without usable timestamps, so the
//! values are mapped onto the day's slots by position, see
//! [`SlotProfile::EIRGRID_QUARTER_HOUR`].
//!
//! The dashboard only splits out wind. Per-type generation is an estimate:
//! the non-wind remainder is distributed over fixed technology shares.

use chrono::{DateTime, TimeZone};
use chrono_tz::Europe::Dublin;

use crate::alignment::{align_sequence, SlotProfile};
use crate::assembly::{assemble, collect_units, distribute_remainder, split_flow, sum_strict};
use crate::catalog::{
    eirgrid_area_url, EirGridArea, ACTUAL_LOAD, GB_TO_IE, IE_GENERATION_SHARES, IE_INTERCONNECTORS,
    IE_TO_GB,
};
use crate::config::Config;
use crate::error::Result;
use crate::http::HttpFetcher;
use crate::normalize::{eirgrid_values, parse_eirgrid_rows, EirGridRow};
use crate::resource::ResourceType;
use crate::table::TimeSeriesTable;
use crate::windowing::{daily_fetch_units, day_slots, FetchUnit};

/// Dashboard slot length in minutes
pub const SLOT_MINUTES: i64 = 15;

/// EirGrid Smart Grid Dashboard client
#[derive(Debug, Clone)]
pub struct EirGridClient {
    fetcher: HttpFetcher,
    base_url: String,
    profile: SlotProfile,
}

impl EirGridClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_fetcher(
            HttpFetcher::from_config(config)?,
            &config.eirgrid_base_url,
        ))
    }

    pub fn with_fetcher(fetcher: HttpFetcher, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile: SlotProfile::EIRGRID_QUARTER_HOUR,
        }
    }

    fn fetch_rows(&self, area: EirGridArea, day: &FetchUnit) -> Result<Option<Vec<EirGridRow>>> {
        let url = eirgrid_area_url(&self.base_url, area, day.date());
        match self.fetcher.get_text(&url)? {
            Some(body) => Ok(Some(parse_eirgrid_rows(&body)?)),
            None => Ok(None),
        }
    }

    /// Values of one area (optionally one field) aligned onto `slot_count` slots
    fn aligned(
        &self,
        rows: &[EirGridRow],
        field_name: Option<&str>,
        slot_count: usize,
    ) -> Result<Vec<Option<f64>>> {
        let values = eirgrid_values(rows, field_name);
        Ok(align_sequence(slot_count, &values, &self.profile)?)
    }

    /// Generation per resource type (MW), quarter-hourly
    ///
    /// `Wind Onshore` is the dashboard's wind series. The other types share
    /// `total - wind` by fixed proportions. A day where only one of the two
    /// areas is available keeps its slots but without values.
    pub fn per_type_generation<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<TimeSeriesTable<ResourceType>> {
        let days = daily_fetch_units(start, end, &Dublin)?;
        let tables = collect_units("EirGrid per-type generation", &days, |day| {
            let wind_rows = self.fetch_rows(EirGridArea::WindActual, day)?;
            let total_rows = self.fetch_rows(EirGridArea::GenerationActual, day)?;
            if wind_rows.is_none() && total_rows.is_none() {
                return Ok(None);
            }

            let slots = day_slots(&Dublin, day.date(), SLOT_MINUTES)?;
            let slot_count = slots.len();
            let wind = match &wind_rows {
                Some(rows) => self.aligned(rows, None, slot_count)?,
                None => vec![None; slot_count],
            };
            let total = match &total_rows {
                Some(rows) => self.aligned(rows, None, slot_count)?,
                None => vec![None; slot_count],
            };

            let estimated = distribute_remainder(&total, &wind, &IE_GENERATION_SHARES);
            let mut table = TimeSeriesTable::with_index(slots);
            table.push_column(ResourceType::WindOnshore, wind)?;
            for (resource, values) in estimated {
                table.push_column(resource, values)?;
            }
            Ok(Some(table))
        })?;

        Ok(assemble(tables, start, end))
    }

    /// All-island demand (MW), quarter-hourly, single column `Actual Load`
    pub fn demand<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<TimeSeriesTable<String>> {
        let days = daily_fetch_units(start, end, &Dublin)?;
        let tables = collect_units("EirGrid demand", &days, |day| {
            let Some(rows) = self.fetch_rows(EirGridArea::DemandActual, day)? else {
                return Ok(None);
            };

            let slots = day_slots(&Dublin, day.date(), SLOT_MINUTES)?;
            let values = self.aligned(&rows, None, slots.len())?;
            let mut table = TimeSeriesTable::with_index(slots);
            table.push_column(ACTUAL_LOAD.to_string(), values)?;
            Ok(Some(table))
        })?;

        Ok(assemble(tables, start, end))
    }

    /// Flows between GB and the island of Ireland over EWIC and Moyle (MW)
    ///
    /// Two non-negative columns, `GB > IE` and `IE > GB`. A slot is missing in
    /// both when either interconnector value is missing.
    pub fn gb_ie_flows<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<TimeSeriesTable<String>> {
        let days = daily_fetch_units(start, end, &Dublin)?;
        let tables = collect_units("EirGrid interconnection", &days, |day| {
            let Some(rows) = self.fetch_rows(EirGridArea::Interconnection, day)? else {
                return Ok(None);
            };

            let slots = day_slots(&Dublin, day.date(), SLOT_MINUTES)?;
            let [ewic, moyle] = IE_INTERCONNECTORS;
            let ewic = self.aligned(&rows, Some(ewic), slots.len())?;
            let moyle = self.aligned(&rows, Some(moyle), slots.len())?;
            let (gb_to_ie, ie_to_gb) = split_flow(&sum_strict(&ewic, &moyle));

            let mut table = TimeSeriesTable::with_index(slots);
            table.push_column(GB_TO_IE.to_string(), gb_to_ie)?;
            table.push_column(IE_TO_GB.to_string(), ie_to_gb)?;
            Ok(Some(table))
        })?;

        Ok(assemble(tables, start, end))
    }
}
