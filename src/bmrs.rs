//! Great Britain market data from the Balancing Mechanism Reporting Service
//!
//! BMRS reports are requested per settlement day (Europe/London) as CSV. Each
//! row carries a 1-based settlement period, which maps straight onto the
//! day's half-hour slots: 48 on normal days, 46 and 50 on clock-change days.

use chrono::{DateTime, TimeZone};
use chrono_tz::Europe::London;
use tracing::warn;

use crate::alignment::align_by_period;
use crate::assembly::{assemble, collect_units};
use crate::catalog::{bmrs_report_url, BmrsReport, ACTUAL_LOAD, GB_GENERATION_TYPES};
use crate::config::Config;
use crate::error::Result;
use crate::http::HttpFetcher;
use crate::normalize::{parse_bmrs_csv, BmrsCsv};
use crate::resource::ResourceType;
use crate::table::TimeSeriesTable;
use crate::windowing::{daily_fetch_units, day_slots, FetchUnit};

/// Settlement period length in minutes
pub const SETTLEMENT_PERIOD_MINUTES: i64 = 30;

const PER_TYPE_PERIOD: &str = "Settlement Period";
const PER_TYPE_RESOURCE: &str = "Power System Resource  Type";
const DEMAND_PERIOD: &str = "SettlementPeriod";
const QUANTITY: &str = "Quantity";

/// BMRS client
#[derive(Debug, Clone)]
pub struct BmrsClient {
    fetcher: HttpFetcher,
    base_url: String,
    api_key: String,
}

impl BmrsClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_fetcher(
            HttpFetcher::from_config(config)?,
            &config.bmrs_base_url,
            &config.bmrs_api_key,
        ))
    }

    pub fn with_fetcher(fetcher: HttpFetcher, base_url: &str, api_key: &str) -> Self {
        if api_key.is_empty() {
            warn!("No BMRS API key configured, requests will be rejected");
        }
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn fetch_report(&self, report: BmrsReport, day: &FetchUnit) -> Result<Option<BmrsCsv>> {
        let url = bmrs_report_url(&self.base_url, report, &self.api_key, day.date());
        match self.fetcher.get_text(&url)? {
            Some(body) => Ok(Some(parse_bmrs_csv(&body)?)),
            None => Ok(None),
        }
    }

    /// Actual generation per resource type (MW), half-hourly
    pub fn per_type_generation<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<TimeSeriesTable<ResourceType>> {
        let days = daily_fetch_units(start, end, &London)?;
        let tables = collect_units("BMRS per-type generation", &days, |day| {
            let Some(report) = self.fetch_report(BmrsReport::B1620, day)? else {
                return Ok(None);
            };

            let slots = day_slots(&London, day.date(), SETTLEMENT_PERIOD_MINUTES)?;
            let slot_count = slots.len();
            let mut table = TimeSeriesTable::with_index(slots);
            for resource in GB_GENERATION_TYPES.iter() {
                let periods = report.period_values(
                    PER_TYPE_PERIOD,
                    QUANTITY,
                    Some((PER_TYPE_RESOURCE, resource.name())),
                )?;
                table.push_column(resource.clone(), align_by_period(slot_count, &periods)?)?;
            }
            Ok(Some(table))
        })?;

        Ok(assemble(tables, start, end))
    }

    /// Actual total load (MW), half-hourly, single column `Actual Load`
    pub fn demand<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<TimeSeriesTable<String>> {
        let days = daily_fetch_units(start, end, &London)?;
        let tables = collect_units("BMRS demand", &days, |day| {
            let Some(report) = self.fetch_report(BmrsReport::B0610, day)? else {
                return Ok(None);
            };

            let slots = day_slots(&London, day.date(), SETTLEMENT_PERIOD_MINUTES)?;
            let periods = report.period_values(DEMAND_PERIOD, QUANTITY, None)?;
            let values = align_by_period(slots.len(), &periods)?;

            let mut table = TimeSeriesTable::with_index(slots);
            table.push_column(ACTUAL_LOAD.to_string(), values)?;
            Ok(Some(table))
        })?;

        Ok(assemble(tables, start, end))
    }
}
