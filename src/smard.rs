//! German market data from SMARD (Bundesnetzagentur)
//!
//! SMARD serves one JSON file per series and ISO week, keyed by the epoch
//! milliseconds of Monday 00:00 Europe/Berlin. Every operation walks the weeks
//! covering the requested interval, fetches the week's files, and trims the
//! concatenated result to `[start, end]`.

use chrono::{DateTime, Datelike, TimeZone};
use chrono_tz::Europe::Berlin;
use tracing::{debug, warn};

use crate::assembly::{assemble, collect_units, net_generation};
use crate::catalog::{
    smard_chart_url, BiddingZone, Resolution, SeriesLabel, ACTUAL_LOAD, SMARD_DEMAND_SERIES,
    SMARD_GENERATION_SERIES, SMARD_NATIONAL_REGION,
};
use crate::config::Config;
use crate::error::Result;
use crate::http::HttpFetcher;
use crate::normalize::smard_table;
use crate::power_plants::{PowerPlantRegistry, UnitLabel};
use crate::resource::ResourceType;
use crate::table::TimeSeriesTable;
use crate::windowing::{weekly_fetch_units, FetchUnit};

/// SMARD client
#[derive(Debug, Clone)]
pub struct SmardClient {
    fetcher: HttpFetcher,
    base_url: String,
}

impl SmardClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_fetcher(
            HttpFetcher::from_config(config)?,
            &config.smard_base_url,
        ))
    }

    pub fn with_fetcher(fetcher: HttpFetcher, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// One week of one series as a single-column table
    fn fetch_week<L>(
        &self,
        label: L,
        series_id: &str,
        region: &str,
        resolution: Resolution,
        week: &FetchUnit,
    ) -> Result<Option<TimeSeriesTable<L>>> {
        let url = smard_chart_url(&self.base_url, series_id, region, resolution, week.epoch_millis());
        match self.fetcher.get_text(&url)? {
            Some(body) => Ok(Some(smard_table(label, &body, resolution)?)),
            None => Ok(None),
        }
    }

    /// Join the single-series tables of one week; `None` if all were missing
    fn join_week<L: Clone + PartialEq>(tables: Vec<TimeSeriesTable<L>>) -> Option<TimeSeriesTable<L>> {
        tables.into_iter().reduce(TimeSeriesTable::join)
    }

    /// Hourly day-ahead prices of a bidding zone (EUR/MWh)
    ///
    /// The single column is labelled with the zone name. Requests outside the
    /// zone's publication period are still sent but logged; they usually
    /// return nothing.
    pub fn day_ahead_prices<T: TimeZone>(
        &self,
        zone: BiddingZone,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<TimeSeriesTable<String>> {
        let first = start.with_timezone(&Berlin).date_naive();
        let last = end.with_timezone(&Berlin).date_naive();
        if !zone.covers(first, last) {
            warn!(
                "Bidding zone {} has no prices for part of {}..{} (available {:?} to {:?})",
                zone,
                first,
                last,
                zone.available_from(),
                zone.available_until()
            );
        }

        let id = zone.api_id().to_string();
        let weeks = weekly_fetch_units(start, end, &Berlin)?;
        let tables = collect_units("SMARD day-ahead prices", &weeks, |week| {
            self.fetch_week(
                zone.name().to_string(),
                &id,
                SMARD_NATIONAL_REGION,
                Resolution::Hour,
                week,
            )
        })?;

        Ok(assemble(tables, start, end))
    }

    /// Realized generation per resource type and kind (MW)
    ///
    /// Columns are labelled `(resource, kind)`; pumped storage has both a
    /// generation and a consumption column.
    pub fn per_type_generation<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<TimeSeriesTable<SeriesLabel>> {
        let weeks = weekly_fetch_units(start, end, &Berlin)?;
        let tables = collect_units("SMARD per-type generation", &weeks, |week| {
            let mut series = Vec::with_capacity(SMARD_GENERATION_SERIES.len());
            for entry in SMARD_GENERATION_SERIES.iter() {
                let table = self.fetch_week(
                    entry.label(),
                    &entry.id.to_string(),
                    SMARD_NATIONAL_REGION,
                    Resolution::QuarterHour,
                    week,
                )?;
                series.extend(table);
            }
            Ok(Self::join_week(series))
        })?;

        Ok(assemble(tables, start, end))
    }

    /// Net generation per resource type (MW): consumption counted negative
    pub fn net_per_type_generation<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<TimeSeriesTable<ResourceType>> {
        Ok(net_generation(&self.per_type_generation(start, end)?))
    }

    /// Realized consumption (MW), single column `Actual Load`
    pub fn demand<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<TimeSeriesTable<String>> {
        let id = SMARD_DEMAND_SERIES.to_string();
        let weeks = weekly_fetch_units(start, end, &Berlin)?;
        let tables = collect_units("SMARD demand", &weeks, |week| {
            self.fetch_week(
                ACTUAL_LOAD.to_string(),
                &id,
                SMARD_NATIONAL_REGION,
                Resolution::QuarterHour,
                week,
            )
        })?;

        Ok(assemble(tables, start, end))
    }

    /// Realized generation per generating unit (MW)
    ///
    /// For each week only units of `registry` active in that week's year are
    /// requested. Columns are labelled with the unit's [`UnitLabel`].
    pub fn per_unit_generation<T: TimeZone>(
        &self,
        registry: &PowerPlantRegistry,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<TimeSeriesTable<UnitLabel>> {
        let weeks = weekly_fetch_units(start, end, &Berlin)?;
        let tables = collect_units("SMARD per-unit generation", &weeks, |week| {
            let year = week.start.year();
            let mut series = Vec::new();
            for unit in registry.active_in_year(year) {
                let table = self.fetch_week(
                    unit.label(),
                    &unit.api_id,
                    &unit.control_area,
                    Resolution::QuarterHour,
                    week,
                )?;
                series.extend(table);
            }
            debug!("{} of {} units delivered data for {}", series.len(), registry.len(), week.start);
            Ok(Self::join_week(series))
        })?;

        Ok(assemble(tables, start, end))
    }
}
