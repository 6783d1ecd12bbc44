#![allow(clippy::unwrap_used)]
// Integration tests for `ApplianceClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bigip_api::{
    ApplianceClient, Error, IpProtocol, LbMode, MemberAddress, SaveMode, StatisticKind,
    TransportConfig, VirtualServerDefinition,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApplianceClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApplianceClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

async fn logged_in() -> (MockServer, ApplianceClient) {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/shared/authn/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "token": { "token": "tok-1" } })),
        )
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "admin-password".to_string().into();
    client.login("admin", &secret).await.unwrap();
    (server, client)
}

fn collection(items: serde_json::Value) -> serde_json::Value {
    json!({ "kind": "tm:collectionstate", "items": items })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_token() {
    let (server, client) = logged_in().await;
    assert!(client.is_logged_in());

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/net/vlan"))
        .and(header("X-F5-Auth-Token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.list_vlans().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/shared/authn/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Authentication failed"))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong".to_string().into();
    let result = client.login("admin", &secret).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_calls_without_login_are_rejected() {
    let (_server, client) = setup().await;
    let result = client.list_pools().await;
    assert!(matches!(result, Err(Error::NotLoggedIn)));
}

#[tokio::test]
async fn test_expired_token_maps_to_authentication() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/virtual"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "code": 401, "message": "token expired" })),
        )
        .mount(&server)
        .await;

    let err = client.list_virtual_servers().await.unwrap_err();
    assert!(
        matches!(err, Error::Authentication { ref message } if message.contains("token expired")),
        "got: {err:?}"
    );
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_slow_appliance_is_a_timeout() {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        timeout: std::time::Duration::from_millis(100),
        ..TransportConfig::default()
    };
    let client = ApplianceClient::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();

    Mock::given(method("POST"))
        .and(path("/mgmt/shared/authn/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "token": { "token": "tok-1" } })),
        )
        .mount(&server)
        .await;
    let secret: secrecy::SecretString = "admin-password".to_string().into();
    client.login("admin", &secret).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/net/vlan"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(collection(json!([])))
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.list_vlans().await.unwrap_err();
    assert!(err.is_timeout(), "got: {err:?}");
}

// ── Network tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_create_vlan_sends_tagged_interface() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/tm/net/vlan"))
        .and(body_partial_json(json!({
            "name": "vlan-100",
            "tag": 100,
            "interfaces": [{ "name": "1.2", "tagged": true }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client.create_vlan("vlan-100", 100, "1.2").await.unwrap();
}

#[tokio::test]
async fn test_list_route_domains() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/net/route-domain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection(json!([
            { "name": "0", "id": 0 },
            { "name": "100", "id": 100, "vlans": ["/Common/vlan-100"] }
        ]))))
        .mount(&server)
        .await;

    let domains = client.list_route_domains().await.unwrap();
    assert_eq!(domains.len(), 2);
    assert_eq!(domains[1].id, 100);
    assert!(domains[0].vlans.is_empty());
}

#[tokio::test]
async fn test_api_error_carries_status_and_message() {
    let (server, client) = logged_in().await;

    Mock::given(method("DELETE"))
        .and(path("/mgmt/tm/net/vlan/~Common~vlan-7"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "message": "vlan-7 is referenced by a self IP"
        })))
        .mount(&server)
        .await;

    let err = client.delete_vlan("vlan-7").await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("referenced"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// ── Local traffic tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_list_pool_members() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/pool/~Common~vs-tcp-192.168.1.10-80/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection(json!([
            { "name": "10.0.0.5:8080", "address": "10.0.0.5" },
            { "name": "10.0.0.6:8080", "address": "10.0.0.6" }
        ]))))
        .mount(&server)
        .await;

    let members = client
        .list_pool_members("vs-tcp-192.168.1.10-80")
        .await
        .unwrap();
    assert_eq!(
        members,
        vec![
            MemberAddress::new("10.0.0.5", 8080),
            MemberAddress::new("10.0.0.6", 8080)
        ]
    );
}

#[tokio::test]
async fn test_create_pool_uses_device_mode() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/tm/ltm/pool"))
        .and(body_partial_json(json!({
            "name": "vs-udp-10.1.1.1-53",
            "loadBalancingMode": "least-connections-member"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .create_pool("vs-udp-10.1.1.1-53", LbMode::LeastConnectionsMember)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_virtual_server_body() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/tm/ltm/virtual"))
        .and(body_partial_json(json!({
            "name": "vs-tcp-192.168.1.10-80",
            "destination": "192.168.1.10:80",
            "mask": "255.255.255.255",
            "ipProtocol": "tcp",
            "pool": "vs-tcp-192.168.1.10-80",
            "profiles": [{ "name": "http", "context": "all" }],
            "sourceAddressTranslation": { "type": "automap" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let def = VirtualServerDefinition {
        name: "vs-tcp-192.168.1.10-80".into(),
        address: "192.168.1.10".into(),
        port: 80,
        protocol: IpProtocol::Tcp,
        mask: "255.255.255.255".into(),
        default_pool: "vs-tcp-192.168.1.10-80".into(),
        profile: "http".into(),
        snat_automap: true,
    };
    client.create_virtual_server(&def).await.unwrap();
}

#[tokio::test]
async fn test_statistics_snapshot_decodes_split_counters() {
    let (server, client) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/virtual/statistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statistics": [{
                "virtualServer": { "name": "vs-tcp-192.168.1.10-80", "address": "192.168.1.10", "port": 80 },
                "statistics": [
                    { "type": "STATISTIC_CLIENT_SIDE_BYTES_IN", "value": { "high": 0, "low": -1 } },
                    { "type": "STATISTIC_TOTAL_REQUESTS", "value": { "high": 0, "low": 3 } }
                ]
            }]
        })))
        .mount(&server)
        .await;

    let stats = client.virtual_server_statistics().await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].virtual_server.address, "192.168.1.10");
    assert_eq!(
        stats[0].statistics[0].kind,
        StatisticKind::StatisticClientSideBytesIn
    );
    assert_eq!(stats[0].statistics[0].value.low, -1);
    assert_eq!(stats[0].statistics[1].kind, StatisticKind::Other);
}

// ── System tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_save_configuration_modes() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/tm/sys/config"))
        .and(body_partial_json(json!({ "command": "save", "options": [{ "base": "" }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/mgmt/tm/sys/config"))
        .and(body_partial_json(json!({ "command": "save", "options": [{ "high-level": "" }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client.save_configuration(SaveMode::BaseLevel).await.unwrap();
    client.save_configuration(SaveMode::HighLevel).await.unwrap();
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let (server, client) = logged_in().await;

    Mock::given(method("DELETE"))
        .and(path("/mgmt/shared/authz/tokens/tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client.logout().await.unwrap();
    assert!(!client.is_logged_in());
}
