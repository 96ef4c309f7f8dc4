#![allow(clippy::unwrap_used)]
// Integration tests for `HueClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use huelink_api::{ApiColorMode, ApiStateUpdate, Error, HueClient};

// ── Helpers ─────────────────────────────────────────────────────────

const USER: &str = "testuser";

async fn setup() -> (MockServer, HueClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = HueClient::with_client(reqwest::Client::new(), base_url);
    client.set_username(SecretString::from(USER.to_owned()));
    (server, client)
}

fn user_path(suffix: &str) -> String {
    if suffix.is_empty() {
        format!("/api/{USER}")
    } else {
        format!("/api/{USER}/{suffix}")
    }
}

fn error_body(error_type: u16, address: &str, description: &str) -> serde_json::Value {
    json!([{ "error": { "type": error_type, "address": address, "description": description } }])
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_link_returns_and_adopts_username() {
    let server = MockServer::start().await;
    let client = HueClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
    );

    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_json(json!({ "devicetype": "huelink#host" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "success": { "username": "newuser" } }])),
        )
        .mount(&server)
        .await;

    let username = client.link("huelink#host").await.unwrap();
    assert_eq!(username.expose_secret(), "newuser");
    assert!(client.has_username());
}

#[tokio::test]
async fn test_link_button_not_pressed() {
    let server = MockServer::start().await;
    let client = HueClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
    );

    Mock::given(method("POST"))
        .and(path("/api"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(error_body(101, "", "link button not pressed")),
        )
        .mount(&server)
        .await;

    let result = client.link("huelink#host").await;
    assert!(
        matches!(result, Err(Error::LinkButtonNotPressed)),
        "expected LinkButtonNotPressed, got: {result:?}"
    );
    assert!(!client.has_username());
}

#[tokio::test]
async fn test_authenticate_rejects_unknown_user() {
    let (server, client) = setup().await;
    client.clear_username();

    Mock::given(method("GET"))
        .and(path("/api/stale/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Philips hue",
            "apiversion": "1.16.0"
        })))
        .mount(&server)
        .await;

    let result = client.authenticate(SecretString::from("stale".to_owned())).await;
    assert!(matches!(result, Err(Error::Unauthorized { .. })));
    assert!(!client.has_username());
}

#[tokio::test]
async fn test_authenticate_adopts_whitelisted_user() {
    let (server, client) = setup().await;
    client.clear_username();

    Mock::given(method("GET"))
        .and(path(user_path("config")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Philips hue",
            "apiversion": "1.16.0",
            "whitelist": { USER: { "name": "huelink#host" } }
        })))
        .mount(&server)
        .await;

    client
        .authenticate(SecretString::from(USER.to_owned()))
        .await
        .unwrap();
    assert!(client.has_username());
}

#[tokio::test]
async fn test_probe_is_unauthenticated() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Philips hue",
            "bridgeid": "001788FFFE23BFC2",
            "modelid": "BSB002",
            "mac": "00:17:88:23:bf:c2",
            "swversion": "1941132080",
            "apiversion": "1.41.0"
        })))
        .mount(&server)
        .await;

    let config = client.probe().await.unwrap();
    assert_eq!(config.bridgeid, "001788FFFE23BFC2");
    assert_eq!(client.api_version().await.unwrap(), "1.41.0");
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_lights() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(user_path("lights")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "1": {
                "name": "Hall",
                "type": "Extended color light",
                "modelid": "LCT015",
                "uniqueid": "00:17:88:01:00:aa:bb:cc-0b",
                "state": { "on": true, "bri": 254, "ct": 366, "colormode": "ct", "reachable": true }
            },
            "2": {
                "name": "Desk",
                "type": "Dimmable light",
                "state": { "on": false, "bri": 1, "reachable": true }
            }
        })))
        .mount(&server)
        .await;

    let lights = client.list_lights().await.unwrap();
    assert_eq!(lights.len(), 2);
    assert_eq!(lights["1"].name, "Hall");
    assert_eq!(lights["1"].state.colormode, Some(ApiColorMode::Ct));
    assert!(!lights["2"].state.on);
}

#[tokio::test]
async fn test_read_error_array_is_typed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(user_path("sensors")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(error_body(1, "/sensors", "unauthorized user")),
        )
        .mount(&server)
        .await;

    let result = client.list_sensors().await;
    assert!(
        matches!(result, Err(Error::Unauthorized { .. })),
        "expected Unauthorized, got: {result:?}"
    );
}

#[tokio::test]
async fn test_full_config_carries_every_collection() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(user_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "config": { "name": "Philips hue", "apiversion": "1.10.0" },
            "lights": { "1": { "name": "Hall", "state": { "on": true } } },
            "groups": { "1": { "name": "Living", "lights": ["1"] } },
            "sensors": {}
        })))
        .mount(&server)
        .await;

    let full = client.full_config().await.unwrap();
    assert_eq!(full.config.apiversion, "1.10.0");
    assert_eq!(full.lights.len(), 1);
    assert_eq!(full.groups["1"].lights, vec!["1".to_owned()]);
    assert!(full.sensors.is_empty());
}

#[tokio::test]
async fn test_not_authenticated_without_username() {
    let (_server, client) = setup().await;
    client.clear_username();

    let result = client.list_groups().await;
    assert!(matches!(result, Err(Error::NotAuthenticated)));
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_light_state_sends_only_set_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(user_path("lights/3/state")))
        .and(body_json(json!({ "on": true, "bri": 100, "transitiontime": 4 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "success": { "/lights/3/state/on": true } },
            { "success": { "/lights/3/state/bri": 100 } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let update = ApiStateUpdate {
        on: Some(true),
        bri: Some(100),
        transitiontime: Some(4),
        ..Default::default()
    };
    client.set_light_state("3", &update).await.unwrap();
}

#[tokio::test]
async fn test_set_light_state_device_off() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(user_path("lights/3/state")))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_body(
            201,
            "/lights/3/state/bri",
            "parameter, bri, is not modifiable. Device is set to off.",
        )))
        .mount(&server)
        .await;

    let update = ApiStateUpdate {
        bri: Some(10),
        ..Default::default()
    };
    let result = client.set_light_state("3", &update).await;
    assert!(
        matches!(result, Err(Error::DeviceOff { .. })),
        "expected DeviceOff, got: {result:?}"
    );
}

#[tokio::test]
async fn test_group_action_resource_not_available() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(user_path("groups/9/action")))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_body(
            3,
            "/groups/9/action",
            "resource, /groups/9/action, not available",
        )))
        .mount(&server)
        .await;

    let result = client
        .set_group_action("9", &ApiStateUpdate::default())
        .await;
    assert!(matches!(result, Err(Error::ResourceNotAvailable { .. })));
}

#[tokio::test]
async fn test_search_lights_with_serials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(user_path("lights")))
        .and(body_json(json!({ "deviceid": ["45AF34", "543636"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "success": { "/lights": "Searching for new devices" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    client
        .search_lights(&["45AF34".to_owned(), "543636".to_owned()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_http_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(user_path("groups")))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    match client.list_groups().await {
        Err(Error::Http { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "busy");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_http_error_with_multibyte_body_is_truncated() {
    let server = MockServer::start().await;
    let client = HueClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
    );
    let body = format!("{}ü…", "a".repeat(199));

    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(503).set_body_string(body))
        .mount(&server)
        .await;

    match client.probe().await {
        Err(Error::Http { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message.chars().count(), 200);
            assert!(message.ends_with('ü'));
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}
