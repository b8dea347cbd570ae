// ABOUTME: Integration tests for the Gateway: envelope fields, request errors and the edge cache.
// ABOUTME: Upstreams are mocked; cache directories live in temporary folders.

use httpmock::prelude::*;
use ptgen_core::{Client, Endpoints, Gateway, GatewayOptions, Query};
use serde_json::Value;

fn gateway_for(server: &MockServer, cache_dir: Option<std::path::PathBuf>) -> Gateway {
    let client = Client::builder()
        .endpoints(Endpoints::all(&server.base_url()))
        .build();
    Gateway::new(
        client,
        GatewayOptions {
            cache_dir,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn missing_parameters_envelope() {
    let server = MockServer::start();
    let envelope = gateway_for(&server, None)
        .handle(&Query::from_query_string(""))
        .await;

    assert!(!envelope.success);
    assert_eq!(
        envelope.error.as_deref(),
        Some("Miss key of `site` or `sid` , or input unsupported resource `url`.")
    );
    assert_eq!(envelope.copyright, "Powered by @Rhilip");
    assert_eq!(envelope.version, env!("CARGO_PKG_VERSION"));
    assert!(envelope.generate_at > 0);
    assert!(envelope.payload.is_empty());
}

#[tokio::test]
async fn url_query_is_resolved_and_flattened() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/subject/253");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(include_str!("fixtures/bangumi_subject.html"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/subject/253/characters");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(include_str!("fixtures/bangumi_characters.html"));
    });

    let query = Query::from_query_string("url=https://bangumi.tv/subject/253");
    let envelope = gateway_for(&server, None).handle(&query).await;

    assert!(envelope.success);
    assert!(envelope.error.is_none());
    assert!(envelope.format.contains("[b]Story: [/b]"));

    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["site"], "bangumi");
    assert_eq!(json["sid"], "253");
    assert_eq!(json["alt"], "https://bgm.tv/subject/253");
    assert_eq!(json["success"], true);
    assert_eq!(json["error"], Value::Null);
}

#[tokio::test]
async fn search_envelope_wraps_data() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/j/subject_suggest");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[{"title":"花样年华","id":"1291557","year":"2000","type":"movie"}]"#);
    });

    let envelope = gateway_for(&server, None)
        .handle(&Query::from_query_string("search=huayangnianhua"))
        .await;

    assert!(envelope.success);
    let data = envelope.payload.get("data").and_then(Value::as_array).unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["title"], "花样年华");
    assert_eq!(data[0]["link"], "https://movie.douban.com/subject/1291557/");
}

#[tokio::test]
async fn second_identical_query_is_served_from_cache() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/game/to-the-moon");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(include_str!("fixtures/indienova_game.html"));
    });

    let dir = tempfile::tempdir().unwrap();
    let gateway = gateway_for(&server, Some(dir.path().to_path_buf()));

    let first = gateway
        .handle(&Query::from_query_string("site=indienova&sid=to-the-moon"))
        .await;
    // Parameter order and debug do not change the cache key.
    let second = gateway
        .handle(&Query::from_query_string("sid=to-the-moon&site=indienova&debug=1"))
        .await;

    page.assert_hits(1);
    assert!(first.success);
    assert_eq!(first, second);
}

#[tokio::test]
async fn internal_fault_carries_debug_and_is_not_cached() {
    let server = MockServer::start();
    let product = server.mock(|when, then| {
        when.method(GET).path("/api/zh-CN/content/products/broken");
        then.status(500).body("upstream exploded");
    });

    let dir = tempfile::tempdir().unwrap();
    let gateway = gateway_for(&server, Some(dir.path().to_path_buf()));
    let query = Query::from_query_string("site=epic&sid=broken&debug=1");

    let first = gateway.handle(&query).await;
    assert!(!first.success);
    let message = first.error.clone().unwrap();
    assert!(message.starts_with("Internal Error, Please contact @Rhilip. Exception: "));

    let debug = first.payload.get("debug").unwrap();
    assert_eq!(debug["request"]["site"], "epic");
    assert!(!debug["frames"].as_array().unwrap().is_empty());

    let second = gateway.handle(&query).await;
    assert!(!second.success);
    product.assert_hits(2);
}

#[tokio::test]
async fn fault_without_debug_has_no_diagnostics() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/zh-CN/content/products/broken");
        then.status(500);
    });

    let envelope = gateway_for(&server, None)
        .handle(&Query::from_query_string("site=epic&sid=broken"))
        .await;
    assert!(!envelope.success);
    assert!(envelope.payload.get("debug").is_none());
}
