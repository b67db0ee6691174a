#![allow(dead_code)]

use gatehouse_cloudflare::ApiClient;
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{Value, json};

pub const TOKEN: &str = "cf-test-token";

pub fn client(server: &MockServer) -> ApiClient {
    ApiClient::with_base_url(TOKEN, server.base_url()).unwrap()
}

pub fn ok(result: Value) -> Value {
    json!({"success": true, "errors": [], "messages": [], "result": result})
}

pub fn failure(code: i64, message: &str) -> Value {
    json!({
        "success": false,
        "errors": [{"code": code, "message": message}],
        "messages": [],
        "result": null
    })
}

pub fn zone(id: &str, name: &str, account_id: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "status": "active",
        "account": {"id": account_id, "name": "Test Account"}
    })
}

pub fn mock_verify<'a>(server: &'a MockServer) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/user/tokens/verify")
            .header("authorization", format!("Bearer {}", TOKEN));
        then.status(200)
            .json_body(ok(json!({"id": "token-id", "status": "active"})));
    })
}

pub fn mock_accounts<'a>(server: &'a MockServer, account_id: &str) -> Mock<'a> {
    let body = ok(json!([{"id": account_id, "name": "Test Account"}]));
    server.mock(|when, then| {
        when.method(GET).path("/accounts");
        then.status(200).json_body(body);
    })
}

pub fn mock_zones<'a>(server: &'a MockServer, account_id: &str, zones: Vec<Value>) -> Mock<'a> {
    let account_id = account_id.to_string();
    server.mock(|when, then| {
        when.method(GET)
            .path("/zones")
            .query_param("account.id", account_id)
            .query_param("status", "active");
        then.status(200).json_body(ok(Value::Array(zones)));
    })
}

pub fn mock_find_dns<'a>(
    server: &'a MockServer,
    zone_id: &str,
    name: &str,
    records: Vec<Value>,
) -> Mock<'a> {
    let path = format!("/zones/{}/dns_records", zone_id);
    let name = name.to_string();
    server.mock(|when, then| {
        when.method(GET).path(path).query_param("name", name);
        then.status(200).json_body(ok(Value::Array(records)));
    })
}

pub fn mock_create_tunnel<'a>(
    server: &'a MockServer,
    account_id: &str,
    tunnel_id: &str,
) -> Mock<'a> {
    let path = format!("/accounts/{}/cfd_tunnel", account_id);
    let body = ok(json!({
        "id": tunnel_id,
        "name": "n8n-testhost-ab12",
        "created_at": "2026-01-15T09:30:00Z"
    }));
    server.mock(|when, then| {
        when.method(POST).path(path).body_includes("\"tunnel_secret\"");
        then.status(200).json_body(body);
    })
}

pub fn mock_configure<'a>(
    server: &'a MockServer,
    account_id: &str,
    tunnel_id: &str,
    status: u16,
    body: Value,
) -> Mock<'a> {
    let path = format!(
        "/accounts/{}/cfd_tunnel/{}/configurations",
        account_id, tunnel_id
    );
    server.mock(|when, then| {
        when.method(PUT).path(path);
        then.status(status).json_body(body);
    })
}

pub fn mock_tunnel_token<'a>(
    server: &'a MockServer,
    account_id: &str,
    tunnel_id: &str,
    status: u16,
    body: Value,
) -> Mock<'a> {
    let path = format!("/accounts/{}/cfd_tunnel/{}/token", account_id, tunnel_id);
    server.mock(|when, then| {
        when.method(GET).path(path);
        then.status(status).json_body(body);
    })
}

pub fn mock_create_dns<'a>(
    server: &'a MockServer,
    zone_id: &str,
    status: u16,
    body: Value,
) -> Mock<'a> {
    let path = format!("/zones/{}/dns_records", zone_id);
    server.mock(|when, then| {
        when.method(POST).path(path);
        then.status(status).json_body(body);
    })
}

pub fn mock_delete_tunnel<'a>(
    server: &'a MockServer,
    account_id: &str,
    tunnel_id: &str,
    status: u16,
    body: Value,
) -> Mock<'a> {
    let path = format!("/accounts/{}/cfd_tunnel/{}", account_id, tunnel_id);
    server.mock(|when, then| {
        when.method(DELETE).path(path).query_param("force", "true");
        then.status(status).json_body(body);
    })
}

pub fn mock_delete_dns<'a>(
    server: &'a MockServer,
    zone_id: &str,
    record_id: &str,
    status: u16,
    body: Value,
) -> Mock<'a> {
    let path = format!("/zones/{}/dns_records/{}", zone_id, record_id);
    server.mock(|when, then| {
        when.method(DELETE).path(path);
        then.status(status).json_body(body);
    })
}
