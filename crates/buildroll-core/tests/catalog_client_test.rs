use buildroll_core::*;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base_url: &str) -> HttpCatalog {
    HttpCatalog::new(
        CatalogConfig::new()
            .with_base_url(base_url)
            .with_timeout(Duration::from_millis(300)),
    )
    .unwrap()
}

// ── Success ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_characters_decodes_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "npc_dota_hero_antimage", "localized_name": "Anti-Mage",
             "primary_attr": "agi", "roles": ["Carry", "Escape"]},
            {"id": 2, "name": "npc_dota_hero_axe", "localized_name": "Axe",
             "primary_attr": "str", "roles": ["Initiator"], "legs": 2}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let heroes = client(&server.uri()).fetch_characters().await.unwrap();
    assert_eq!(heroes.len(), 2);
    assert_eq!(heroes[0].localized_name.as_deref(), Some("Anti-Mage"));
    assert_eq!(heroes[1].primary_attr.as_deref(), Some("str"));
}

#[tokio::test]
async fn test_fetch_equipment_keeps_catalog_order() {
    let server = MockServer::start().await;
    let body = r#"{
        "zeta_blade": {"dname": "Zeta Blade", "cost": 4100, "components": ["claymore"]},
        "alpha_staff": {"localized_name": "Alpha Staff", "cost": 2600, "recipe": 0},
        "recipe_thing": {"cost": 500, "recipe": 1, "components": null}
    }"#;
    Mock::given(method("GET"))
        .and(path("/constants/items"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let items = client(&server.uri()).fetch_equipment().await.unwrap();
    let keys: Vec<&str> = items.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta_blade", "alpha_staff", "recipe_thing"]);
    assert!(!items["alpha_staff"].is_recipe());
    assert!(items["recipe_thing"].is_recipe());
}

// ── Error mapping ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bad_status_is_reported_with_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server.uri()).fetch_characters().await.unwrap_err();
    assert_eq!(err.endpoint, Endpoint::Characters);
    assert_eq!(err.kind, FetchErrorKind::BadStatus(503));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/constants/items"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = client(&server.uri()).fetch_equipment().await.unwrap_err();
    assert_eq!(err.endpoint, Endpoint::Equipment);
    assert_eq!(err.kind, FetchErrorKind::Timeout);
}

#[tokio::test]
async fn test_invalid_json_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server.uri()).fetch_characters().await.unwrap_err();
    assert!(matches!(err.kind, FetchErrorKind::Malformed(_)));
}

#[tokio::test]
async fn test_wrong_shape_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"heroes": []})))
        .mount(&server)
        .await;

    let err = client(&server.uri()).fetch_characters().await.unwrap_err();
    assert!(matches!(err.kind, FetchErrorKind::Malformed(_)));
}

#[tokio::test]
async fn test_refused_connection_is_unreachable() {
    let err = client("http://127.0.0.1:1").fetch_characters().await.unwrap_err();
    assert!(matches!(err.kind, FetchErrorKind::Unreachable(_)), "got {:?}", err.kind);
}

// ── Through the service ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_service_over_http_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "npc_dota_hero_axe", "localized_name": "Axe", "primary_attr": "str", "roles": []},
            {"id": 2, "name": "npc_dota_hero_lina", "localized_name": "Lina", "primary_attr": "int", "roles": []},
            {"id": 3, "name": "npc_dota_hero_sven", "localized_name": "Sven", "primary_attr": "str", "roles": []},
            {"id": 4, "name": "npc_dota_hero_meepo", "localized_name": "Meepo", "primary_attr": "agi", "roles": []}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/constants/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "satanic": {"dname": "Satanic", "cost": 5050, "components": ["lifesteal"]},
            "trident": {"dname": "Trident", "cost": 6000, "components": ["kaya"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = BuildService::from_catalog(
        std::sync::Arc::new(client(&server.uri())),
        EligibilityRules::default(),
        BuildConfig::default(),
    )
    .unwrap();

    for _ in 0..3 {
        let build = service.get_random_build().await.unwrap();
        let mut names: Vec<&str> = build.characters.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Axe", "Lina", "Sven"]);
        assert_eq!(build.equipment, vec![EquipmentPick { name: "Satanic".into(), cost: 5050 }]);
    }
}

#[tokio::test]
async fn test_mistyped_records_are_filtered_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "npc_dota_hero_axe", "localized_name": "Axe", "primary_attr": "str"},
            {"id": "x2", "name": "npc_dota_hero_lina", "localized_name": "Lina", "primary_attr": "int"},
            {"id": 3, "name": "npc_dota_hero_sven", "localized_name": "Sven", "primary_attr": "str"},
            {"id": 4, "name": 7, "localized_name": "Broken"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/constants/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "satanic": {"dname": "Satanic", "cost": 5050, "components": ["lifesteal"]},
            "weird": {"dname": "Weird", "cost": "3000", "components": ["claymore"]}
        })))
        .mount(&server)
        .await;

    let service = BuildService::from_catalog(
        std::sync::Arc::new(client(&server.uri())),
        EligibilityRules::default(),
        BuildConfig::default(),
    )
    .unwrap();

    let summary = service.refresh_all().await;
    assert!(summary.is_success(), "{}", summary);
    assert_eq!(summary.characters.unwrap(), 3);
    assert_eq!(summary.equipment.unwrap(), 1);

    let build = service.get_random_build().await.unwrap();
    let mut names: Vec<&str> = build.characters.iter().map(|c| c.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Axe", "Lina", "Sven"]);
    assert_eq!(build.equipment, vec![EquipmentPick { name: "Satanic".into(), cost: 5050 }]);
}
