//! Integration tests for `OpenWeatherClient` using wiremock HTTP mocks.

use std::sync::Arc;

use weatherview_core::{
    CityName, Condition, Coordinates, DisabledGeolocator, FetchError, FetchOutcome, Icon,
    LocationQuery, MemoryStore, OpenWeatherClient, RequestStatus, ViewModelOptions, WeatherClient,
    WeatherViewModel,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OpenWeatherClient {
    OpenWeatherClient::with_base_url("test-key".into(), base_url)
        .expect("client construction should not fail")
}

fn jakarta_body() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": 106.8451, "lat": -6.2146 },
        "weather": [{ "id": 721, "main": "Haze", "description": "haze", "icon": "50d" }],
        "main": { "temp": 31.2, "feels_like": 37.1, "humidity": 66, "pressure": 1009 },
        "visibility": 4000,
        "wind": { "speed": 3.6, "deg": 340 },
        "sys": { "country": "ID" },
        "name": "Jakarta",
        "cod": 200
    })
}

#[tokio::test]
async fn fetch_by_name_sends_metric_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Jakarta"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jakarta_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let query = LocationQuery::Name(CityName::parse("Jakarta").unwrap());
    let snap = client.fetch(&query).await.expect("should parse weather");

    assert_eq!(snap.place, "Jakarta");
    assert_eq!(snap.country, "ID");
    assert_eq!(snap.condition, Condition::Haze);
    assert_eq!(snap.icon(), Icon::Haze);
    assert_eq!(snap.description, "haze");
    assert_eq!(snap.temperature_rounded(), 31);
    assert_eq!(snap.feels_like_rounded(), 37);
    assert_eq!(snap.humidity_pct, 66);
    assert_eq!(snap.visibility_km(), Some(4.0));
    assert_eq!(snap.wind_speed_mps, 3.6);
}

#[tokio::test]
async fn fetch_by_coordinates_sends_lat_lon() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "1"))
        .and(query_param("lon", "2"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jakarta_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let query = LocationQuery::Coordinates(Coordinates::new(1.0, 2.0));
    client.fetch(&query).await.expect("should parse weather");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].url.query_pairs().any(|(k, _)| k == "q"));
}

#[tokio::test]
async fn not_found_carries_provider_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let query = LocationQuery::Name(CityName::parse("Atlantis").unwrap());
    let err = client.fetch(&query).await.unwrap_err();

    assert!(matches!(err, FetchError::Api { status: 404, .. }));
    assert_eq!(err.user_message(), "city not found");
}

#[tokio::test]
async fn empty_error_body_uses_generic_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let query = LocationQuery::Name(CityName::parse("Paris").unwrap());
    let err = client.fetch(&query).await.unwrap_err();

    assert!(matches!(err, FetchError::Api { status: 500, message: None }));
    assert_eq!(err.user_message(), "Error fetching data");
}

#[tokio::test]
async fn malformed_success_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let query = LocationQuery::Name(CityName::parse("Paris").unwrap());
    let err = client.fetch(&query).await.unwrap_err();

    assert!(matches!(err, FetchError::Decode(_)));
    assert_eq!(err.user_message(), "Error fetching data");
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    // Port 9 (discard) on localhost is closed in test environments.
    let client = test_client("http://127.0.0.1:9");
    let query = LocationQuery::Name(CityName::parse("Paris").unwrap());
    let err = client.fetch(&query).await.unwrap_err();

    assert!(matches!(err, FetchError::Network(_)));
    assert_eq!(err.user_message(), "Error fetching data");
}

#[tokio::test]
async fn view_model_over_http_uses_persisted_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("lat", "1"))
        .and(query_param("lon", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jakarta_body()))
        .expect(1)
        .mount(&server)
        .await;

    let vm = WeatherViewModel::new(
        Arc::new(test_client(&server.uri())),
        Arc::new(MemoryStore::with_coordinates(Coordinates::new(1.0, 2.0))),
        Arc::new(DisabledGeolocator),
        LocationQuery::Name(CityName::parse("Jakarta").unwrap()),
        ViewModelOptions::default(),
    );

    vm.initialize().await;

    let state = vm.state();
    assert_eq!(state.status, RequestStatus::Idle);
    assert_eq!(state.snapshot.as_deref().map(|s| s.place.as_str()), Some("Jakarta"));
}

#[tokio::test]
async fn view_model_over_http_surfaces_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("q", "Atlantis"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let vm = WeatherViewModel::new(
        Arc::new(test_client(&server.uri())),
        Arc::new(MemoryStore::new()),
        Arc::new(DisabledGeolocator),
        LocationQuery::Name(CityName::parse("Jakarta").unwrap()),
        ViewModelOptions::default(),
    );

    let outcome = vm.search("Atlantis").await.unwrap();

    assert_eq!(outcome, FetchOutcome::Failed("city not found".into()));
    assert_eq!(vm.state().error(), Some("city not found"));
}
