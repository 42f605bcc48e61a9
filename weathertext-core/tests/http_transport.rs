//! Integration tests for the reqwest transport using WireMock
//!
//! These tests mock the OpenWeatherMap endpoints to verify request building
//! and response handling without making actual API calls.

use serde_json::json;
use std::{sync::Arc, time::Duration};
use weathertext_core::{
    ConditionTag, FixedPicker, HttpTransport, JsonPhraseBook, Transport, TransportError,
    WeatherService,
    config::ApiOptions,
    provider::ProviderRequest,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

// =============================================================================
// Test Helpers
// =============================================================================

fn transport() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(5)).expect("Failed to create transport")
}

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn current_weather_response() -> serde_json::Value {
    json!({
        "coord": { "lon": 4.85, "lat": 45.75 },
        "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04n" }],
        "main": { "temp": 7.31, "feels_like": 5.2, "humidity": 81 },
        "wind": { "speed": 2.06, "deg": 200 },
        "dt": 1_710_100_800,
        "sys": { "country": "FR", "sunrise": 1_710_050_400, "sunset": 1_710_092_700 },
        "name": "Lyon",
        "cod": 200
    })
}

// =============================================================================
// Transport Tests
// =============================================================================

#[tokio::test]
async fn fetch_sends_query_parameters_and_parses_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("appid", "KEY"))
        .and(query_param("units", "metric"))
        .and(query_param("q", "Lyon,fr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_response()))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/data/2.5/weather", server.uri());
    let response = transport()
        .fetch(&url, &params(&[("appid", "KEY"), ("units", "metric"), ("q", "Lyon,fr")]))
        .await
        .expect("fetch should succeed");

    assert_eq!(response.status, 200);
    assert_eq!(response.body["name"], "Lyon");
}

#[tokio::test]
async fn non_json_body_is_passed_through_as_string() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
        .mount(&server)
        .await;

    let url = format!("{}/data/2.5/weather", server.uri());
    let response = transport().fetch(&url, &[]).await.expect("fetch should succeed");

    assert_eq!(response.body, json!("plain text"));
}

#[tokio::test]
async fn error_status_becomes_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "cod": 401,
            "message": "Invalid API key."
        })))
        .mount(&server)
        .await;

    let url = format!("{}/data/2.5/weather", server.uri());
    let err = transport().fetch(&url, &[]).await.unwrap_err();

    match err {
        TransportError::Status { status, body, .. } => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid API key."));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_host_is_a_request_error() {
    let err = transport()
        .fetch("http://127.0.0.1:9/data/2.5/weather", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Request { .. }));
}

// =============================================================================
// Service over HTTP
// =============================================================================

#[tokio::test]
async fn service_round_trip_against_mock_provider() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("id", "2996944"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_response()))
        .expect(1)
        .mount(&server)
        .await;

    let phrases = Arc::new(JsonPhraseBook::embedded().expect("embedded tables"));
    let service =
        WeatherService::new(Arc::new(transport()), phrases).with_picker(FixedPicker(0));

    service.update_config(|cfg| {
        cfg.set_api(ApiOptions {
            key: Some("KEY".into()),
            host: Some(server.uri()),
            version: None,
        });
        cfg.set_locale("en-US");
        cfg.set_position(&weathertext_core::PositionOptions {
            city_id: Some("2996944".into()),
            ..Default::default()
        })
    });

    let request = ProviderRequest::from_config(&service.config()).expect("key is set");
    assert_eq!(request.url, format!("{}/data/2.5/weather", server.uri()));

    let report = service.get().await.expect("request should succeed");
    assert_eq!(report.weather.condition, ConditionTag::Cloudy);
    assert_eq!(report.weather.city, "Lyon");
    // Default speed unit is km/h: 2.06 m/s * 3.6.
    assert_eq!(report.weather.wind_speed, 7.42);
    assert_eq!(report.text.advanced, "At Lyon : the temperature is 7.31°C, cloudy");
}
