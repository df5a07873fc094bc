use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde_json::{Value, json};
use tfc_exporter_core::{
    api::{ApiError, ClientConfig, ListOptions, TerraformApi, TfeClient},
    metrics::exposition,
    scrape::{Exporter, ScopeResolver, ScraperRegistry},
};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
struct Recorded {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    authorization: Arc<Mutex<Vec<String>>>,
}

fn record_auth(state: &Recorded, headers: &HeaderMap) {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        state.authorization.lock().unwrap().push(value.to_string());
    }
}

fn organization_fixture(name: &str) -> Value {
    json!({
        "id": name,
        "type": "organizations",
        "attributes": {
            "name": name,
            "created-at": "2020-01-02T03:04:05.678Z",
            "email": "x@acme.io",
            "external-id": "org-ext-1",
            "owners-team-saml-role-id": "owners",
            "saml-enabled": true,
            "two-factor-conformant": false
        }
    })
}

fn workspaces_fixture() -> Value {
    json!({
        "meta": {
            "pagination": {
                "current-page": 1,
                "prev-page": null,
                "next-page": null,
                "total-pages": 1,
                "total-count": 2
            }
        },
        "data": [{
            "id": "test-id-1",
            "type": "workspaces",
            "attributes": {
                "name": "dev",
                "created-at": "2010-10-10T10:10:10.101Z",
                "environment": "test-environment",
                "terraform-version": "0.14.3"
            },
            "relationships": {
                "organization": {"data": {"id": "test-org", "type": "organizations"}},
                "current-run": {"data": {"id": "run-id-1", "type": "runs"}}
            }
        }, {
            "id": "test-id-2",
            "type": "workspaces",
            "attributes": {
                "name": "stg",
                "created-at": "2010-10-10T10:10:10.101Z",
                "environment": "test-environment",
                "terraform-version": "0.14.2"
            },
            "relationships": {
                "organization": {"data": {"id": "test-org", "type": "organizations"}}
            }
        }],
        "included": [{
            "id": "run-id-1",
            "type": "runs",
            "attributes": {
                "created-at": "2010-10-10T10:10:10.101Z",
                "status": "applied"
            }
        }]
    })
}

async fn list_organizations(
    State(state): State<Recorded>,
    headers: HeaderMap,
) -> Json<Value> {
    record_auth(&state, &headers);
    Json(json!({
        "data": [organization_fixture("acme"), organization_fixture("globex")],
        "meta": {"pagination": {"current-page": 1, "total-pages": 1, "total-count": 2}}
    }))
}

async fn read_organization(
    State(state): State<Recorded>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    record_auth(&state, &headers);
    if name == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"errors": [{"status": "404", "title": "not found"}]})),
        );
    }
    (StatusCode::OK, Json(json!({ "data": organization_fixture(&name) })))
}

async fn list_workspaces(
    State(state): State<Recorded>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    record_auth(&state, &headers);
    state.queries.lock().unwrap().push(query);
    match name.as_str() {
        "test-org" => (StatusCode::OK, Json(workspaces_fixture())),
        "limited" => (StatusCode::TOO_MANY_REQUESTS, Json(json!({}))),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"errors": ["boom"]})),
        ),
    }
}

async fn serve() -> (TfeClient, Recorded) {
    let state = Recorded::default();
    let app = Router::new()
        .route("/api/v2/organizations", get(list_organizations))
        .route("/api/v2/organizations/{name}", get(read_organization))
        .route(
            "/api/v2/organizations/{name}/workspaces",
            get(list_workspaces),
        )
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = TfeClient::new(&ClientConfig {
        address: format!("http://{addr}"),
        token: "test-token".into(),
        insecure_skip_verify: false,
    })
    .unwrap();
    (client, state)
}

#[tokio::test]
async fn lists_organizations_with_bearer_token() {
    let (client, state) = serve().await;

    let organizations = client.list_organizations().await.unwrap();

    let names: Vec<_> = organizations.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["acme", "globex"]);
    assert_eq!(
        *state.authorization.lock().unwrap(),
        vec!["Bearer test-token".to_string()]
    );
}

#[tokio::test]
async fn reads_organization_attributes() {
    let (client, _) = serve().await;

    let organization = client.read_organization("acme").await.unwrap();

    assert_eq!(organization.email, "x@acme.io");
    assert_eq!(organization.external_id, "org-ext-1");
    assert!(organization.saml_enabled);
    assert!(!organization.two_factor_conformant);
    assert!(organization.created_at.is_some());
}

#[tokio::test]
async fn maps_error_statuses() {
    let (client, _) = serve().await;

    let err = client.read_organization("missing").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    let options = ListOptions::page(1, 20);
    let err = client.list_workspaces("limited", &options).await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimited));

    let err = client.list_workspaces("broken", &options).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, .. }));
}

#[tokio::test]
async fn workspace_listing_sends_page_parameters() {
    let (client, state) = serve().await;

    let page = client
        .list_workspaces(
            "test-org",
            &ListOptions::page(3, 7).with_include("current_run"),
        )
        .await
        .unwrap();

    assert_eq!(page.pagination.total_pages, 1);
    assert_eq!(page.pagination.total_count, 2);
    assert_eq!(page.items.len(), 2);
    let run = page.items[0].current_run.as_ref().unwrap();
    assert_eq!(run.id, "run-id-1");
    assert_eq!(run.status.as_deref(), Some("applied"));
    assert!(page.items[1].current_run.is_none());

    let queries = state.queries.lock().unwrap();
    assert_eq!(queries[0].get("page[number]").map(String::as_str), Some("3"));
    assert_eq!(queries[0].get("page[size]").map(String::as_str), Some("7"));
    assert_eq!(
        queries[0].get("include").map(String::as_str),
        Some("current_run")
    );
}

#[tokio::test]
async fn full_run_renders_workspace_series() {
    let (client, _) = serve().await;
    let exporter = Exporter::new(
        Arc::new(client),
        ScopeResolver::new(vec!["test-org".into()]),
        ScraperRegistry::builtin(),
        20,
    )
    .unwrap();

    let observations = exporter.collect(&CancellationToken::new()).await;
    let registry =
        exposition::run_registry(&observations, exporter.metrics()).unwrap();
    let text = exposition::encode_text(&registry.gather()).unwrap();

    assert!(text.contains(
        "tf_workspaces_info{created_at=\"2010-10-10T10:10:10.101Z\",current_run=\"run-id-1\",\
         current_run_created_at=\"2010-10-10T10:10:10.101Z\",current_run_status=\"applied\",\
         environment=\"test-environment\",id=\"test-id-1\",name=\"dev\",organization=\"test-org\",\
         terraform_version=\"0.14.3\"} 1"
    ));
    assert!(text.contains("current_run=\"na\",current_run_created_at=\"na\",current_run_status=\"na\""));
    assert!(text.contains("tf_organizations_info{"));
    assert!(text.contains("tf_exporter_scrapes_total 1"));
    assert!(text.contains("tf_exporter_last_scrape_error 0"));
    assert!(text.contains("tf_exporter_collector_duration_seconds{collector=\"collect.workspaces\"}"));
}
