//! SMARD operations against a mocked chart data server

use std::time::Duration;

use chrono::{DateTime, TimeZone};
use chrono_tz::Europe::Berlin;
use chrono_tz::Tz;
use grid_market_data::catalog::Resolution;
use grid_market_data::normalize::smard_table;
use grid_market_data::{
    ApiError, BiddingZone, Config, FailurePolicy, HttpFetcher, MarketDataError,
    PowerPlantRecord, PowerPlantRegistry, ResourceType, SeriesKind, SeriesLabel, SmardClient,
    TimeSeriesTable, YearBound,
};
use mockito::{Server, ServerGuard};
use serde_json::json;

/// Monday 2023-09-18 00:00 Europe/Berlin
const WEEK_38: i64 = 1_694_988_000_000;
/// Monday 2023-09-25 00:00 Europe/Berlin
const WEEK_39: i64 = 1_695_592_800_000;
/// Monday 2023-10-02 00:00 Europe/Berlin
const WEEK_40: i64 = 1_696_197_600_000;

const QUARTER_HOUR_MS: i64 = 900_000;
const HOUR_MS: i64 = 3_600_000;

fn chart(start_ms: i64, step_ms: i64, values: &[Option<f64>]) -> String {
    let series: Vec<_> = values
        .iter()
        .enumerate()
        .map(|(i, v)| json!([start_ms + i as i64 * step_ms, v]))
        .collect();
    json!({ "meta_data": { "version": 1 }, "series": series }).to_string()
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn client(server: &ServerGuard, policy: FailurePolicy) -> SmardClient {
    init_logging();
    let fetcher = HttpFetcher::new(Duration::from_secs(5), policy).unwrap();
    SmardClient::with_fetcher(fetcher, &server.url())
}

fn berlin(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
    Berlin.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

#[test]
fn test_demand_single_week_scaled_to_mw() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/chart_data/410/DE/410_DE_quarterhour_1694988000000.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chart(
            WEEK_38,
            QUARTER_HOUR_MS,
            &[Some(12_000.0), Some(12_100.0), None, Some(12_300.0)],
        ))
        .create();

    let start = berlin(2023, 9, 18, 0, 0);
    let end = berlin(2023, 9, 18, 0, 30);
    let table = client(&server, FailurePolicy::Skip)
        .demand(&start, &end)
        .unwrap();

    mock.assert();
    assert_eq!(table.len(), 3);
    assert_eq!(table.index()[0], start);
    assert_eq!(
        table.column(&"Actual Load".to_string()).unwrap(),
        &[Some(48_000.0), Some(48_400.0), None]
    );
}

#[test]
fn test_missing_week_becomes_hole() {
    let mut server = Server::new();
    let _week38 = server
        .mock("GET", "/chart_data/410/DE/410_DE_quarterhour_1694988000000.json")
        .with_body(chart(WEEK_38, QUARTER_HOUR_MS, &[Some(1.0), Some(2.0)]))
        .create();
    let week39 = server
        .mock("GET", "/chart_data/410/DE/410_DE_quarterhour_1695592800000.json")
        .with_status(404)
        .create();
    let _week40 = server
        .mock("GET", "/chart_data/410/DE/410_DE_quarterhour_1696197600000.json")
        .with_body(chart(WEEK_40, QUARTER_HOUR_MS, &[Some(3.0), Some(4.0)]))
        .create();

    let start = berlin(2023, 9, 18, 0, 0);
    let end = berlin(2023, 10, 8, 23, 45);
    let table = client(&server, FailurePolicy::Skip)
        .demand(&start, &end)
        .unwrap();

    week39.assert();
    assert_eq!(table.len(), 4);
    assert_eq!(table.index()[2], berlin(2023, 10, 2, 0, 0));
    assert!(table.index().windows(2).all(|w| w[0] < w[1]));
    assert_eq!(
        table.value_at(&berlin(2023, 10, 2, 0, 15), &"Actual Load".to_string()),
        Some(16.0)
    );
}

#[test]
fn test_month_across_clock_change_is_contiguous() {
    let mut server = Server::new();

    // Monday boundaries covering October 2023; clocks go back on the 29th
    let mondays = [
        berlin(2023, 9, 25, 0, 0),
        berlin(2023, 10, 2, 0, 0),
        berlin(2023, 10, 9, 0, 0),
        berlin(2023, 10, 16, 0, 0),
        berlin(2023, 10, 23, 0, 0),
        berlin(2023, 10, 30, 0, 0),
        berlin(2023, 11, 6, 0, 0),
    ];

    let mut weeks = Vec::new();
    let mut mocks = Vec::new();
    for pair in mondays.windows(2) {
        let (from, to) = (pair[0].timestamp_millis(), pair[1].timestamp_millis());
        let values: Vec<Option<f64>> = (from..to)
            .step_by(QUARTER_HOUR_MS as usize)
            .map(|ms| Some(((ms / QUARTER_HOUR_MS) % 1000) as f64))
            .collect();
        let body = chart(from, QUARTER_HOUR_MS, &values);
        mocks.push(
            server
                .mock(
                    "GET",
                    format!("/chart_data/410/DE/410_DE_quarterhour_{}.json", from).as_str(),
                )
                .with_body(body.clone())
                .expect(1)
                .create(),
        );
        weeks.push(smard_table("Actual Load".to_string(), &body, Resolution::QuarterHour).unwrap());
    }

    let start = berlin(2023, 10, 1, 0, 0);
    let end = berlin(2023, 10, 31, 23, 45);
    let table = client(&server, FailurePolicy::Skip)
        .demand(&start, &end)
        .unwrap();

    for mock in &mocks {
        mock.assert();
    }
    assert_eq!(table.len(), 31 * 96 + 4);
    assert_eq!(table.index()[0], start);
    assert_eq!(table.index().last(), Some(&end));
    assert!(table
        .index()
        .windows(2)
        .all(|w| (w[1] - w[0]).num_minutes() == 15));
    assert_eq!(table, TimeSeriesTable::concat(weeks).slice(&start, &end));
}

#[test]
fn test_abort_policy_fails_request() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/chart_data/410/DE/410_DE_quarterhour_1694988000000.json")
        .with_status(500)
        .create();

    let start = berlin(2023, 9, 18, 0, 0);
    let err = client(&server, FailurePolicy::Abort)
        .demand(&start, &start)
        .unwrap_err();

    assert!(matches!(
        err,
        MarketDataError::Api(ApiError::HttpError { status: 500, .. })
    ));
}

#[test]
fn test_malformed_body_is_parse_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/chart_data/410/DE/410_DE_quarterhour_1694988000000.json")
        .with_body("<html>maintenance</html>")
        .create();

    let start = berlin(2023, 9, 18, 0, 0);
    let err = client(&server, FailurePolicy::Skip)
        .demand(&start, &start)
        .unwrap_err();

    assert!(matches!(err, MarketDataError::Parse(_)));
}

#[test]
fn test_day_ahead_prices_hourly_unscaled() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/chart_data/4169/DE/4169_DE_hour_1694988000000.json")
        .with_body(chart(WEEK_38, HOUR_MS, &[Some(95.5), Some(-3.2), Some(88.0)]))
        .create();

    let start = berlin(2023, 9, 18, 0, 0);
    let end = berlin(2023, 9, 18, 2, 0);
    let table = client(&server, FailurePolicy::Skip)
        .day_ahead_prices(BiddingZone::DeLu, &start, &end)
        .unwrap();

    mock.assert();
    assert_eq!(table.labels().collect::<Vec<_>>(), vec!["DE_LU"]);
    assert_eq!(
        table.column(&"DE_LU".to_string()).unwrap(),
        &[Some(95.5), Some(-3.2), Some(88.0)]
    );
}

#[test]
fn test_prices_from_utc_window() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/chart_data/4169/DE/4169_DE_hour_1695592800000.json")
        .with_body(chart(WEEK_39, HOUR_MS, &[Some(1.0), Some(2.0), Some(3.0)]))
        .create();

    // 2023-09-24 22:00 UTC is Monday 00:00 in Berlin
    let start = chrono::Utc.with_ymd_and_hms(2023, 9, 24, 22, 0, 0).unwrap();
    let end = chrono::Utc.with_ymd_and_hms(2023, 9, 24, 23, 0, 0).unwrap();
    let table = client(&server, FailurePolicy::Skip)
        .day_ahead_prices(BiddingZone::DeLu, &start, &end)
        .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.index()[0].to_rfc3339(), "2023-09-25T00:00:00+02:00");
}

#[test]
fn test_per_type_gross_and_net() {
    let mut server = Server::new();
    let _generation = server
        .mock("GET", "/chart_data/4070/DE/4070_DE_quarterhour_1694988000000.json")
        .with_body(chart(WEEK_38, QUARTER_HOUR_MS, &[Some(100.0), Some(200.0)]))
        .create();
    let _consumption = server
        .mock("GET", "/chart_data/4387/DE/4387_DE_quarterhour_1694988000000.json")
        .with_body(chart(WEEK_38, QUARTER_HOUR_MS, &[Some(25.0), None]))
        .create();

    let smard = client(&server, FailurePolicy::Skip);
    let start = berlin(2023, 9, 18, 0, 0);
    let end = berlin(2023, 9, 18, 0, 15);

    let gross = smard.per_type_generation(&start, &end).unwrap();
    let consumption = SeriesLabel {
        resource: ResourceType::HydroPumpedStorage,
        kind: SeriesKind::ActualConsumption,
    };
    assert_eq!(gross.columns().len(), 2);
    assert_eq!(gross.column(&consumption).unwrap(), &[Some(100.0), None]);

    let net = smard.net_per_type_generation(&start, &end).unwrap();
    assert_eq!(
        net.labels().collect::<Vec<_>>(),
        vec![&ResourceType::HydroPumpedStorage]
    );
    assert_eq!(
        net.column(&ResourceType::HydroPumpedStorage).unwrap(),
        &[Some(300.0), Some(800.0)]
    );
}

fn unit(api_id: &str, control_area: &str, decommissioning: YearBound) -> PowerPlantRecord {
    PowerPlantRecord {
        bna: format!("BNA{}", api_id),
        eic: format!("EIC{}", api_id),
        see: String::new(),
        plant_name: format!("Plant {}", api_id),
        block_name: "Block A".to_string(),
        company: "Energy AG".to_string(),
        city: "Berlin".to_string(),
        postal_code: "10115".to_string(),
        address: "Street 1".to_string(),
        latitude: Some(52.5),
        longitude: Some(13.4),
        resource: ResourceType::FossilGas,
        capacity: 300.0,
        control_area: control_area.to_string(),
        api_id: api_id.to_string(),
        commissioning: YearBound::Year(2000),
        decommissioning,
    }
}

#[test]
fn test_per_unit_skips_inactive_units() {
    let mut server = Server::new();
    let active = server
        .mock("GET", "/chart_data/22736/50Hertz/22736_50Hertz_quarterhour_1694988000000.json")
        .with_body(chart(WEEK_38, QUARTER_HOUR_MS, &[Some(50.0)]))
        .create();
    let retired = server
        .mock("GET", "/chart_data/999/TenneT/999_TenneT_quarterhour_1694988000000.json")
        .expect(0)
        .create();

    let registry = PowerPlantRegistry::new(vec![
        unit("22736", "50Hertz", YearBound::Infinity),
        unit("999", "TenneT", YearBound::Year(2010)),
    ]);
    let start = berlin(2023, 9, 18, 0, 0);
    let table = client(&server, FailurePolicy::Skip)
        .per_unit_generation(&registry, &start, &start)
        .unwrap();

    active.assert();
    retired.assert();
    let label = registry.records()[0].label();
    assert_eq!(table.columns().len(), 1);
    assert_eq!(table.column(&label).unwrap(), &[Some(200.0)]);
    assert_eq!(label.control_area, "50Hertz");
}

const LANG: &str = r#"{"plant.a":"Kraftwerk A","block.a":"Block 1","city.a":"Hamburg"}"#;

const METADATA: &str = r#"{"plants":[{"name":"plant.a","city":"city.a",
    "resource":"KW-Energieträger.Erdgas","company":"Stadtwerke","postalCode":"20095",
    "address":"Hafen 1","coordinates":[53.55,9.99],"regionId":"50Hertz",
    "blocks":[{"id":"SEE900000001","name":"block.a","productionId":4711,
    "blockNumber":"BNA1","blockCode":"EIC1","commissioning":2012,"status":"in Betrieb","power":410}]}]}"#;

#[test]
fn test_registry_refresh_and_cache() {
    let mut server = Server::new();
    let lang = server
        .mock("GET", "/assets/translations/lang-de.json")
        .with_body(LANG)
        .expect(1)
        .create();
    let metadata = server
        .mock("GET", "/power_plant_data/power_plant_metadata.json")
        .with_body(METADATA)
        .expect(1)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        smard_base_url: server.url(),
        power_plant_list_path: dir.path().join("smard_power_plant_list.csv"),
        ..Config::default()
    };
    let fetcher = HttpFetcher::from_config(&config).unwrap();

    let fresh = PowerPlantRegistry::load_or_refresh(&fetcher, &config).unwrap();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh.records()[0].plant_name, "Kraftwerk A");
    assert_eq!(fresh.records()[0].see, "SEE900000001");
    assert!(config.power_plant_list_path.exists());

    // Second call is served from the cached file
    let cached = PowerPlantRegistry::load_or_refresh(&fetcher, &config).unwrap();
    assert_eq!(cached, fresh);

    lang.assert();
    metadata.assert();
}

#[test]
fn test_registry_refresh_aborts_without_translations() {
    let mut server = Server::new();
    let _lang = server
        .mock("GET", "/assets/translations/lang-de.json")
        .with_status(503)
        .create();
    let metadata = server
        .mock("GET", "/power_plant_data/power_plant_metadata.json")
        .expect(0)
        .create();

    let fetcher = HttpFetcher::new(Duration::from_secs(5), FailurePolicy::Skip).unwrap();
    let refreshed = PowerPlantRegistry::refresh(&fetcher, &server.url()).unwrap();

    assert!(refreshed.is_none());
    metadata.assert();
}
