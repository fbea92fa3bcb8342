//! Integration tests for the OpenWeather provider and the weather client
//! against a mock HTTP server.

use std::sync::Arc;

use weatherdash_core::{
    Coordinates, IpLocator, Locator, OpenWeatherProvider, WeatherClient, WeatherError,
    WeatherProvider,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const API_KEY: &str = "test-key";

fn current_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1257, "lat": 51.5085 },
        "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
        "base": "stations",
        "main": { "temp": 11.4, "feels_like": 10.6, "pressure": 1009, "humidity": 82 },
        "visibility": 9000,
        "wind": { "speed": 5.1, "deg": 230 },
        "clouds": { "all": 75 },
        "dt": 1_792_400_400,
        "sys": { "country": "GB", "sunrise": 1_792_392_000, "sunset": 1_792_430_000 },
        "timezone": 3600,
        "id": 2_643_743,
        "name": name,
        "cod": 200
    })
}

fn forecast_body() -> serde_json::Value {
    let list: Vec<_> = (0..16i64)
        .map(|i| {
            serde_json::json!({
                "dt": 1_792_400_400 + i * 10_800,
                "main": { "temp": 8.0 + i as f64 * 0.5, "feels_like": 7.0, "humidity": 80 },
                "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
                "dt_txt": "ignored"
            })
        })
        .collect();

    serde_json::json!({
        "cod": "200",
        "cnt": list.len(),
        "list": list,
        "city": { "name": "London", "country": "GB" }
    })
}

fn provider(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::with_base_url(API_KEY.to_string(), server.uri())
}

fn client(server: &MockServer) -> WeatherClient {
    WeatherClient::new(Arc::new(provider(server)))
}

async fn mount_city(server: &MockServer, city: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", city))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_current_by_coords(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "51.5085"))
        .and(query_param("lon", "-0.1257"))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_forecast(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(response)
        .mount(server)
        .await;
}

fn london() -> Coordinates {
    Coordinates::new(51.5085, -0.1257).unwrap()
}

// ============================================================================
// Success scenarios
// ============================================================================

#[tokio::test]
async fn fetch_by_city_returns_unified_result() {
    let server = MockServer::start().await;
    mount_city(&server, "London", ResponseTemplate::new(200).set_body_json(current_body("London"))).await;
    mount_current_by_coords(&server, ResponseTemplate::new(200).set_body_json(current_body("City of London"))).await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body())).await;

    let result = client(&server).fetch_by_city("London").await.unwrap();

    assert_eq!(result.location_label, "London");
    assert_eq!(result.coordinates, london());
    assert_eq!(result.forecast.len(), 16);
    assert_eq!(result.current.condition.code, 500);
    assert_eq!(result.current.pressure_hpa, 1009);
    assert_eq!(result.forecast[0].condition.description, "broken clouds");
}

#[tokio::test]
async fn requests_carry_key_and_metric_units() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("appid", API_KEY))
        .and(query_param("units", "metric"))
        .and(query_param("lat", "51.5085"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;

    let samples = provider(&server).forecast_by_coordinates(london()).await.unwrap();
    assert_eq!(samples.len(), 16);
}

#[tokio::test]
async fn coordinates_fetch_uses_reported_name() {
    let server = MockServer::start().await;
    mount_current_by_coords(&server, ResponseTemplate::new(200).set_body_json(current_body("Westminster"))).await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body())).await;

    let result = client(&server).fetch_by_coordinates(london(), None).await.unwrap();
    assert_eq!(result.location_label, "Westminster");
}

#[tokio::test]
async fn coordinates_fetch_without_name_uses_coordinate_label() {
    let server = MockServer::start().await;
    mount_current_by_coords(&server, ResponseTemplate::new(200).set_body_json(current_body(""))).await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body())).await;

    let result = client(&server).fetch_by_coordinates(london(), None).await.unwrap();
    assert_eq!(result.location_label, "51.51, -0.13");
}

// ============================================================================
// Failure scenarios
// ============================================================================

#[tokio::test]
async fn unknown_city_is_not_found() {
    let server = MockServer::start().await;
    mount_city(
        &server,
        "Atlantis",
        ResponseTemplate::new(404).set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
    )
    .await;

    let err = client(&server).fetch_by_city("Atlantis").await.unwrap_err();

    assert_eq!(err, WeatherError::NotFound { city: "Atlantis".into() });
    assert_eq!(
        err.user_message(),
        "Couldn't find weather for \"Atlantis\". Try a different city name."
    );
}

#[tokio::test]
async fn city_lookup_server_error_is_unavailable() {
    let server = MockServer::start().await;
    mount_city(&server, "London", ResponseTemplate::new(502)).await;

    let err = client(&server).fetch_by_city("London").await.unwrap_err();
    assert!(matches!(err, WeatherError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn current_500_with_good_forecast_is_unavailable() {
    let server = MockServer::start().await;
    mount_current_by_coords(&server, ResponseTemplate::new(500).set_body_string("boom")).await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body())).await;

    let err = client(&server).fetch_by_coordinates(london(), Some("London".into())).await.unwrap_err();

    assert!(matches!(err, WeatherError::ServiceUnavailable(_)));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn current_without_sys_is_invalid() {
    let server = MockServer::start().await;
    let mut body = current_body("London");
    body.as_object_mut().unwrap().remove("sys");
    mount_current_by_coords(&server, ResponseTemplate::new(200).set_body_json(body)).await;
    mount_forecast(&server, ResponseTemplate::new(200).set_body_json(forecast_body())).await;

    let err = client(&server).fetch_by_coordinates(london(), None).await.unwrap_err();
    assert!(matches!(err, WeatherError::InvalidResponse(_)));
}

#[tokio::test]
async fn forecast_with_null_list_is_invalid() {
    let server = MockServer::start().await;
    mount_forecast(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "cod": "200", "list": null })),
    )
    .await;

    let err = provider(&server).forecast_by_coordinates(london()).await.unwrap_err();
    assert!(matches!(err, WeatherError::InvalidResponse(_)));
}

#[tokio::test]
async fn non_json_body_is_invalid() {
    let server = MockServer::start().await;
    mount_current_by_coords(&server, ResponseTemplate::new(200).set_body_string("<html>")).await;

    let err = provider(&server).current_by_coordinates(london()).await.unwrap_err();
    assert!(matches!(err, WeatherError::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let provider = OpenWeatherProvider::with_base_url(API_KEY.to_string(), "http://127.0.0.1:9");

    let err = provider.forecast_by_coordinates(london()).await.unwrap_err();
    assert!(matches!(err, WeatherError::ServiceUnavailable(_)));
}

// ============================================================================
// IP locator
// ============================================================================

#[tokio::test]
async fn ip_locator_returns_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "city": "Lisbon",
            "latitude": 38.7223,
            "longitude": -9.1393,
            "country_name": "Portugal"
        })))
        .mount(&server)
        .await;

    let locator = IpLocator::with_url(format!("{}/json/", server.uri()));
    let coords = locator.locate().await.unwrap();

    assert_eq!(coords, Coordinates::new(38.7223, -9.1393).unwrap());
}

#[tokio::test]
async fn ip_locator_failure_is_location_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let locator = IpLocator::with_url(format!("{}/json/", server.uri()));
    let err = locator.locate().await.unwrap_err();

    assert!(matches!(err, WeatherError::LocationDenied(_)));
}

#[tokio::test]
async fn ip_locator_without_coordinates_is_location_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": true })))
        .mount(&server)
        .await;

    let locator = IpLocator::with_url(format!("{}/json/", server.uri()));
    assert!(matches!(locator.locate().await, Err(WeatherError::LocationDenied(_))));
}
