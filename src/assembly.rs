//! Aggregation and assembly
//!
//! Per-unit tables are stacked in chronological order and trimmed to the
//! caller's window. Derived series (net generation, directional flows, the
//! Irish per-type estimate) are computed here from already aligned columns.

use chrono::{DateTime, TimeZone};
use tracing::{debug, info, warn};

use crate::catalog::SeriesLabel;
use crate::error::Result;
use crate::resource::ResourceType;
use crate::table::TimeSeriesTable;
use crate::windowing::FetchUnit;

/// Run `fetch` for every unit in order and collect the tables it returns
///
/// A unit yielding `Ok(None)` is a hole: it is logged and left out. Errors
/// are propagated and stop the loop.
pub fn collect_units<L>(
    what: &str,
    units: &[FetchUnit],
    mut fetch: impl FnMut(&FetchUnit) -> Result<Option<TimeSeriesTable<L>>>,
) -> Result<Vec<TimeSeriesTable<L>>> {
    let mut tables = Vec::with_capacity(units.len());

    for unit in units {
        match fetch(unit)? {
            Some(table) => {
                debug!("{}: {} rows for unit {}", what, table.len(), unit.start);
                tables.push(table);
            }
            None => warn!("{}: no data for unit starting {}", what, unit.start),
        }
    }

    info!(
        "{}: fetched {} of {} units",
        what,
        tables.len(),
        units.len()
    );
    Ok(tables)
}

/// Concatenate per-unit tables in order and keep rows within `[start, end]`
///
/// # Examples
///
/// ```
/// # use chrono::TimeZone;
/// # use chrono_tz::Europe::Berlin;
/// # use grid_market_data::assembly::assemble;
/// # use grid_market_data::table::TimeSeriesTable;
/// let t0 = Berlin.with_ymd_and_hms(2023, 9, 18, 0, 0, 0).unwrap();
/// let t1 = Berlin.with_ymd_and_hms(2023, 9, 25, 0, 0, 0).unwrap();
/// let week1 = TimeSeriesTable::from_points("load", vec![(t0, Some(1.0))]);
/// let week2 = TimeSeriesTable::from_points("load", vec![(t1, Some(2.0))]);
///
/// let table = assemble(vec![week1, week2], &t0, &t0);
/// assert_eq!(table.len(), 1);
/// ```
pub fn assemble<L, T>(
    tables: impl IntoIterator<Item = TimeSeriesTable<L>>,
    start: &DateTime<T>,
    end: &DateTime<T>,
) -> TimeSeriesTable<L>
where
    L: Clone + PartialEq,
    T: TimeZone,
{
    TimeSeriesTable::concat(tables).slice(start, end)
}

/// Fold generation and consumption series of each resource into one column
///
/// Consumption counts negative. Only present values are summed; a slot where
/// every series of a resource is missing stays missing.
pub fn net_generation(table: &TimeSeriesTable<SeriesLabel>) -> TimeSeriesTable<ResourceType> {
    table.combine_columns(|label| (label.resource.clone(), label.kind.net_sign()))
}

/// Element-wise sum that is missing when either side is missing
pub fn sum_strict(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(x + y),
            _ => None,
        })
        .collect()
}

/// Split a signed flow into its two non-negative directions
///
/// Positive values flow forward, negative values backward; missing stays
/// missing in both directions.
///
/// # Examples
///
/// ```
/// # use grid_market_data::assembly::split_flow;
/// let (forward, backward) = split_flow(&[Some(300.0), Some(-120.0), None]);
/// assert_eq!(forward, vec![Some(300.0), Some(0.0), None]);
/// assert_eq!(backward, vec![Some(0.0), Some(120.0), None]);
/// ```
pub fn split_flow(flow: &[Option<f64>]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let forward = flow.iter().map(|f| f.map(|v| v.max(0.0))).collect();
    let backward = flow.iter().map(|f| f.map(|v| (-v).max(0.0))).collect();
    (forward, backward)
}

/// Distribute `total - wind` over resource types by fixed shares
///
/// The remainder is missing where either input is missing.
pub fn distribute_remainder(
    total: &[Option<f64>],
    wind: &[Option<f64>],
    shares: &[(ResourceType, f64)],
) -> Vec<(ResourceType, Vec<Option<f64>>)> {
    let remainder: Vec<Option<f64>> = total
        .iter()
        .zip(wind)
        .map(|(t, w)| match (t, w) {
            (Some(t), Some(w)) => Some(t - w),
            _ => None,
        })
        .collect();

    shares
        .iter()
        .map(|(resource, share)| {
            let values = remainder.iter().map(|r| r.map(|v| v * share)).collect();
            (resource.clone(), values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SeriesKind;
    use crate::error::MarketDataError;
    use crate::windowing::{daily_fetch_units, Granularity};
    use chrono::Duration;
    use chrono_tz::Europe::{Berlin, Dublin};
    use chrono_tz::Tz;

    fn quarter_hours(start: DateTime<Tz>, n: usize) -> Vec<DateTime<Tz>> {
        (0..n)
            .map(|i| start + Duration::minutes(15 * i as i64))
            .collect()
    }

    #[test]
    fn test_assemble_trims_inclusive_window() {
        let t0 = Berlin.with_ymd_and_hms(2023, 9, 18, 0, 0, 0).unwrap();
        let index = quarter_hours(t0, 8);
        let mut table = TimeSeriesTable::with_index(index.clone());
        table
            .push_column("x", (0..8).map(|v| Some(v as f64)).collect())
            .unwrap();

        let out = assemble(vec![table], &index[2], &index[5]);
        assert_eq!(out.len(), 4);
        assert_eq!(out.index().first(), Some(&index[2]));
        assert_eq!(out.index().last(), Some(&index[5]));
    }

    #[test]
    fn test_assemble_handles_holes() {
        let t0 = Berlin.with_ymd_and_hms(2023, 9, 18, 0, 0, 0).unwrap();
        let t2 = t0 + Duration::weeks(2);
        let first = TimeSeriesTable::from_points("x", vec![(t0, Some(1.0))]);
        let third = TimeSeriesTable::from_points("x", vec![(t2, Some(3.0))]);

        let out = assemble(vec![first, third], &t0, &t2);
        assert_eq!(out.len(), 2);
        assert_eq!(out.value_at(&t2, &"x"), Some(3.0));
    }

    #[test]
    fn test_net_generation_pumped_storage() {
        let t0 = Berlin.with_ymd_and_hms(2023, 9, 18, 0, 0, 0).unwrap();
        let mut table = TimeSeriesTable::with_index(quarter_hours(t0, 3));
        let label = |resource, kind| SeriesLabel { resource, kind };

        table
            .push_column(
                label(ResourceType::HydroPumpedStorage, SeriesKind::ActualAggregated),
                vec![Some(400.0), None, None],
            )
            .unwrap();
        table
            .push_column(
                label(ResourceType::HydroPumpedStorage, SeriesKind::ActualConsumption),
                vec![Some(100.0), Some(50.0), None],
            )
            .unwrap();
        table
            .push_column(
                label(ResourceType::Solar, SeriesKind::ActualAggregated),
                vec![Some(1.0), Some(2.0), Some(3.0)],
            )
            .unwrap();

        let net = net_generation(&table);
        assert_eq!(
            net.labels().cloned().collect::<Vec<_>>(),
            vec![ResourceType::HydroPumpedStorage, ResourceType::Solar]
        );
        assert_eq!(
            net.column(&ResourceType::HydroPumpedStorage).unwrap(),
            &[Some(300.0), Some(-50.0), None]
        );
        assert_eq!(
            net.column(&ResourceType::Solar).unwrap(),
            &[Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_split_flow_properties() {
        let flow = vec![Some(10.0), Some(-4.0), Some(0.0), None];
        let (gb_ie, ie_gb) = split_flow(&flow);

        for ((f, a), b) in flow.iter().zip(&gb_ie).zip(&ie_gb) {
            match f {
                Some(f) => {
                    let (a, b) = (a.unwrap(), b.unwrap());
                    assert!(a >= 0.0 && b >= 0.0);
                    assert!(a == 0.0 || b == 0.0);
                    assert_eq!(a - b, *f);
                }
                None => assert!(a.is_none() && b.is_none()),
            }
        }
    }

    #[test]
    fn test_sum_strict() {
        assert_eq!(
            sum_strict(&[Some(1.0), None, Some(2.0)], &[Some(2.0), Some(1.0), None]),
            vec![Some(3.0), None, None]
        );
    }

    #[test]
    fn test_distribute_remainder() {
        let shares = [(ResourceType::FossilGas, 0.75), (ResourceType::Other, 0.25)];
        let out = distribute_remainder(&[Some(1000.0), None], &[Some(200.0), Some(5.0)], &shares);

        assert_eq!(out[0].0, ResourceType::FossilGas);
        assert_eq!(out[0].1, vec![Some(600.0), None]);
        assert_eq!(out[1].1, vec![Some(200.0), None]);
    }

    #[test]
    fn test_collect_units_skips_holes_and_stops_on_error() {
        let start = Dublin.with_ymd_and_hms(2023, 9, 18, 0, 0, 0).unwrap();
        let end = start + Duration::days(2);
        let units = daily_fetch_units(&start, &end, &Dublin).unwrap();
        assert_eq!(units.len(), 3);
        assert!(units.iter().all(|u| u.granularity == Granularity::Day));

        let tables = collect_units("test", &units, |unit| {
            if unit.date() == start.date_naive() {
                Ok(None)
            } else {
                Ok(Some(TimeSeriesTable::from_points(
                    "x",
                    vec![(unit.start, Some(1.0))],
                )))
            }
        })
        .unwrap();
        assert_eq!(tables.len(), 2);

        let err = collect_units("test", &units, |_| -> Result<Option<TimeSeriesTable<&str>>> {
            Err(MarketDataError::Config("boom".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, MarketDataError::Config(_)));
    }
}
