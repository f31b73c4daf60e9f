//! The PostgREST adapter against a mock HTTP server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use agency_sync::domain::repo::{ListQuery, OrderBy, RecordStore};
use agency_sync::domain::resource::{ClientsResource, ResourceOptions, TransactionsResource};
use agency_sync::infra::store::RestRecordStore;
use common::{client_row, new_client, tx_row};
use httpmock::prelude::*;
use serde_json::json;
use uuid::Uuid;

fn store_for(server: &MockServer) -> Arc<RestRecordStore> {
    Arc::new(
        RestRecordStore::new(&server.base_url(), "test-key", Duration::from_secs(5))
            .expect("valid store"),
    )
}

#[tokio::test]
async fn query_sends_order_limit_and_credentials() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/transactions")
                .query_param("select", "*")
                .query_param("order", "created_at.desc")
                .query_param("limit", "50")
                .header("apikey", "test-key")
                .header("Authorization", "Bearer test-key");
            then.status(200).json_body(json!([
                tx_row("expense", "paid", 150, "Hosting", 1),
                tx_row("income", "paid", 599, "Monthly fee", 2),
            ]));
        })
        .await;

    let txs = TransactionsResource::mount(
        store_for(&server),
        ResourceOptions {
            limit: Some(50),
            ..ResourceOptions::default()
        },
    )
    .await;

    list.assert_async().await;
    assert_eq!(txs.len(), 2);
    assert_eq!(txs.items()[0].description, "Hosting");
    assert!(txs.error().is_none());
}

#[tokio::test]
async fn insert_returns_the_stored_row() {
    let server = MockServer::start_async().await;
    let mut stored = client_row("Padaria Sol", "padaria-sol", "active", 599);
    stored["plan"] = json!("essential");
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/clients");
            then.status(200).json_body(json!([]));
        })
        .await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/clients")
                .header("Prefer", "return=representation");
            then.status(201).json_body(json!([stored.clone()]));
        })
        .await;

    let clients = ClientsResource::mount(store_for(&server), ResourceOptions::default()).await;
    let created = clients
        .create(new_client("Padaria Sol", "padaria-sol"))
        .await
        .unwrap();

    list.assert_async().await;
    insert.assert_async().await;
    assert_eq!(created.id.to_string(), stored["id"].as_str().unwrap());
    assert_eq!(clients.items(), vec![created]);
}

#[tokio::test]
async fn store_message_becomes_the_resource_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/vault_credentials");
            then.status(401)
                .json_body(json!({"message": "Invalid API key", "hint": "check the key"}));
        })
        .await;

    let vault = agency_sync::domain::resource::CredentialsResource::mount(
        store_for(&server),
        ResourceOptions {
            collection: Some("vault_credentials".into()),
            ..ResourceOptions::default()
        },
    )
    .await;

    assert!(vault.is_empty());
    assert_eq!(vault.error().as_deref(), Some("Invalid API key"));
}

#[tokio::test]
async fn update_and_delete_target_a_single_id() {
    let server = MockServer::start_async().await;
    let id = Uuid::new_v4();
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/clients")
                .query_param("id", format!("eq.{id}"));
            then.status(200).json_body(json!([]));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/rest/v1/clients")
                .query_param("id", format!("eq.{id}"));
            then.status(204);
        })
        .await;

    let store = store_for(&server);
    let err = store
        .update_by_id("clients", id, json!({"name": "x"}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no row with id"));
    store.delete_by_id("clients", id).await.unwrap();

    patch.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn non_array_listing_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/clients");
            then.status(200).json_body(json!({"unexpected": true}));
        })
        .await;

    let result = store_for(&server)
        .query_all("clients", &ListQuery::ordered(OrderBy::asc("name")))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn unparsable_body_names_the_collection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/transactions");
            then.status(200).body("<html>gateway</html>");
        })
        .await;

    let err = store_for(&server)
        .query_all("transactions", &ListQuery::ordered(OrderBy::desc("created_at")))
        .await
        .unwrap_err();
    assert!(
        err.to_string()
            .starts_with("unexpected response from 'transactions'"),
        "{err}"
    );
}
