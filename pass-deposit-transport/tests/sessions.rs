// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

mod common;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use common::{PDF, SUPPLEMENT, fixture, package, serve, zip_entries};
use pass_deposit_transport::{
    ConnectivityService, HttpSettings, OnSuccess, Protocol, STATUS_REF_HINT, Transport,
    TransportConfig, TransportError,
};
use serde_json::{Value, json};

fn transport(config: TransportConfig) -> Transport {
    let http = HttpSettings::default();
    let connectivity = ConnectivityService::new(&http).unwrap();
    Transport::from_config(&config, &http, &connectivity).unwrap()
}

fn no_hints() -> BTreeMap<String, String> {
    BTreeMap::new()
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn devnull_answers_with_a_fake_handle() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let transport = transport(TransportConfig::DevNull);
    assert_eq!(transport.protocol(), Protocol::DevNull);
    assert!(transport.check_connectivity(&no_hints()).await);

    let session = transport.open(&no_hints()).await.unwrap();
    let response = session.send(&package, &no_hints()).await;
    assert!(response.success);
    assert_eq!(response.on_success, Some(OnSuccess::FakeHandle));
    assert!(!package.is_opened());
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn filesystem_writes_the_package() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let target = tempfile::tempdir().unwrap();
    let transport = transport(TransportConfig::Filesystem {
        directory: target.path().to_path_buf(),
    });
    assert!(transport.check_connectivity(&no_hints()).await);

    let session = transport.open(&no_hints()).await.unwrap();
    let response = session.send(&package, &no_hints()).await;
    assert!(response.success, "{:?}", response.error);

    let written = std::fs::canonicalize(target.path()).unwrap().join("My%20Article.zip");
    let Some(OnSuccess::Complete { access_url }) = response.on_success else {
        panic!("unexpected on-success {:?}", response.on_success);
    };
    assert_eq!(access_url.to_file_path().unwrap(), written);

    let entries = zip_entries(&std::fs::read(&written).unwrap());
    assert_eq!(
        entries,
        vec![
            ("manuscript.pdf".to_owned(), PDF.to_vec()),
            ("data.csv".to_owned(), SUPPLEMENT.to_vec()),
        ]
    );
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn filesystem_missing_directory() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let missing = fixture.dir.path().join("nowhere");
    let transport = transport(TransportConfig::Filesystem { directory: missing });
    assert!(!transport.check_connectivity(&no_hints()).await);

    let response = transport
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(!response.success);
    assert!(matches!(response.error, Some(TransportError::Io { .. })));
    assert!(!package.is_opened());
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn filesystem_leaves_nothing_behind_when_the_package_breaks() {
    let fixture = fixture();
    let package = package(&fixture).await;
    std::fs::remove_file(fixture.dir.path().join("manuscript.pdf")).unwrap();
    let target = tempfile::tempdir().unwrap();
    let transport = transport(TransportConfig::Filesystem {
        directory: target.path().to_path_buf(),
    });

    let response = transport
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(!response.success);
    assert!(matches!(response.error, Some(TransportError::Io { .. })));
    assert!(package.is_opened());
    let left: Vec<_> = std::fs::read_dir(target.path()).unwrap().collect();
    assert!(left.is_empty(), "{left:?}");
}

#[derive(Default)]
struct SwordState {
    headers: Option<HeaderMap>,
    body: Vec<u8>,
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn sword_deposit_and_statement() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let state = Arc::new(Mutex::new(SwordState::default()));

    let addr = serve(|addr| {
        let receipt = format!(
            r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <link rel="alternate" href="http://{addr}/handle/42"/>
  <link rel="http://purl.org/net/sword/terms/statement" type="application/atom+xml;type=feed" href="http://{addr}/statement/42.atom"/>
</entry>"#
        );
        Router::new()
            .route(
                "/collection",
                post(
                    move |State(state): State<Arc<Mutex<SwordState>>>, headers: HeaderMap, body: Bytes| async move {
                        let mut state = state.lock().unwrap();
                        state.headers = Some(headers);
                        state.body = body.to_vec();
                        (StatusCode::CREATED, receipt)
                    },
                ),
            )
            .route(
                "/statement/42.atom",
                get(|| async {
                    r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <category term="http://dspace.org/state/inreview" scheme="http://purl.org/net/sword/terms/state"/>
</feed>"#
                }),
            )
            .with_state(state.clone())
    })
    .await;

    let transport = transport(TransportConfig::Sword {
        collection_url: format!("http://{addr}/collection").parse().unwrap(),
        username: "depositor".into(),
        password: "secret".into(),
        on_behalf_of: Some("ada".into()),
        packaging: "http://purl.org/net/sword/package/SimpleZip".into(),
    });
    assert!(transport.check_connectivity(&no_hints()).await);

    let response = transport
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(response.success, "{:?}", response.error);
    let statement = format!("http://{addr}/statement/42.atom");
    assert_eq!(response.status_ref.as_deref(), Some(statement.as_str()));
    assert_eq!(
        response.on_success,
        Some(OnSuccess::InProgress {
            item_url: Some(format!("http://{addr}/handle/42").parse().unwrap()),
        })
    );

    {
        let state = state.lock().unwrap();
        let headers = state.headers.as_ref().unwrap();
        assert_eq!(headers["content-type"], "application/zip");
        assert_eq!(headers["content-disposition"], "attachment; filename=My%20Article.zip");
        assert_eq!(headers["packaging"], "http://purl.org/net/sword/package/SimpleZip");
        assert_eq!(headers["on-behalf-of"], "ada");
        assert!(headers["authorization"].to_str().unwrap().starts_with("Basic "));
        assert_eq!(zip_entries(&state.body).len(), 2);
    }

    assert_eq!(
        transport.statement_state(&statement).await.unwrap(),
        "http://dspace.org/state/inreview"
    );
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn sword_rejection_is_a_failed_response() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let addr = serve(|_| {
        Router::new().route("/collection", post(|| async { (StatusCode::FORBIDDEN, "no") }))
    })
    .await;

    let transport = transport(TransportConfig::Sword {
        collection_url: format!("http://{addr}/collection").parse().unwrap(),
        username: "depositor".into(),
        password: "wrong".into(),
        on_behalf_of: None,
        packaging: "http://purl.org/net/sword/package/SimpleZip".into(),
    });
    let response = transport
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(!response.success);
    assert!(matches!(response.error, Some(TransportError::Http { status: 403, .. })));
    assert!(response.status_ref.is_none());
}

#[test_log::test(tokio::test)]
async fn statement_state_needs_a_statement_protocol() {
    let err = transport(TransportConfig::DevNull)
        .statement_state("http://example.org/statement")
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Protocol { .. }));
}

#[derive(Default)]
struct InvenioState {
    drafts: Vec<Value>,
    deleted: Vec<String>,
    uploads: BTreeMap<String, Vec<u8>>,
    committed: Vec<String>,
    publish_calls: usize,
    failing_publishes: usize,
}

type Invenio = Arc<Mutex<InvenioState>>;

fn invenio_app(state: Invenio) -> Router {
    Router::new()
        .route(
            "/api/user/records",
            get(|State(state): State<Invenio>| async move {
                let drafts = state.lock().unwrap().drafts.clone();
                Json(json!({ "hits": { "hits": drafts } }))
            }),
        )
        .route(
            "/api/records/:id/draft",
            delete(|State(state): State<Invenio>, Path(id): Path<String>| async move {
                state.lock().unwrap().deleted.push(id);
                StatusCode::NO_CONTENT
            }),
        )
        .route(
            "/api/records",
            post(|Json(record): Json<Value>| async move {
                assert_eq!(record["metadata"]["title"], "My Article");
                Json(json!({
                    "id": "rec-1",
                    "links": { "latest_html": "https://invenio.example.org/records/rec-1/latest" }
                }))
            }),
        )
        .route(
            "/api/records/:id/draft/files",
            post(|Json(keys): Json<Value>| async move { (StatusCode::CREATED, Json(keys)) }),
        )
        .route(
            "/api/records/:id/draft/files/:key/content",
            put(
                |State(state): State<Invenio>, Path((_, key)): Path<(String, String)>, body: Bytes| async move {
                    state.lock().unwrap().uploads.insert(key, body.to_vec());
                    StatusCode::OK
                },
            ),
        )
        .route(
            "/api/records/:id/draft/files/:key/commit",
            post(|State(state): State<Invenio>, Path((_, key)): Path<(String, String)>| async move {
                state.lock().unwrap().committed.push(key);
                StatusCode::OK
            }),
        )
        .route(
            "/api/records/:id/draft/actions/publish",
            post(|State(state): State<Invenio>| async move {
                let mut state = state.lock().unwrap();
                state.publish_calls += 1;
                if state.publish_calls <= state.failing_publishes {
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                } else {
                    StatusCode::ACCEPTED.into_response()
                }
            }),
        )
        .with_state(state)
}

fn invenio_transport(addr: std::net::SocketAddr) -> Transport {
    transport(TransportConfig::InvenioRdm {
        api_url: format!("http://{addr}/api/").parse().unwrap(),
        api_token: "token".into(),
        verify_tls: true,
        publish_attempts: 3,
        publish_delay_ms: 10,
    })
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn invenio_replaces_stale_draft_and_publishes() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let state = Invenio::default();
    {
        let mut state = state.lock().unwrap();
        state.drafts = vec![
            json!({ "id": "old-1", "is_published": false, "metadata": { "title": "My Article" } }),
            json!({ "id": "pub-1", "is_published": true, "metadata": { "title": "My Article" } }),
        ];
        state.failing_publishes = 1;
    }
    let addr = serve(|_| invenio_app(state.clone())).await;

    let transport = invenio_transport(addr);
    let response = transport
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(response.success, "{:?}", response.error);
    assert_eq!(
        response.on_success,
        Some(OnSuccess::Complete {
            access_url: "https://invenio.example.org/records/rec-1/latest".parse().unwrap(),
        })
    );

    let state = state.lock().unwrap();
    assert_eq!(state.deleted, vec!["old-1".to_owned()]);
    assert_eq!(state.uploads["manuscript.pdf"], PDF);
    assert_eq!(state.uploads["data.csv"], SUPPLEMENT);
    assert_eq!(state.committed, vec!["manuscript.pdf".to_owned(), "data.csv".to_owned()]);
    assert_eq!(state.publish_calls, 2);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn invenio_gives_up_after_the_configured_publish_attempts() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let state = Invenio::default();
    state.lock().unwrap().failing_publishes = usize::MAX;
    let addr = serve(|_| invenio_app(state.clone())).await;

    let response = invenio_transport(addr)
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(!response.success);
    assert!(response.on_success.is_none());
    match response.error {
        Some(TransportError::Http { url, status: 500, .. }) => {
            assert!(url.ends_with("/api/records/rec-1/draft/actions/publish"), "{url}");
        }
        other => panic!("unexpected error {other:?}"),
    }

    let state = state.lock().unwrap();
    assert_eq!(state.publish_calls, 3);
    assert_eq!(state.committed.len(), 2);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn invenio_refuses_ambiguous_drafts() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let state = Invenio::default();
    state.lock().unwrap().drafts = vec![
        json!({ "id": "old-1", "is_published": false, "metadata": { "title": "My Article" } }),
        json!({ "id": "old-2", "is_published": false, "metadata": { "title": "My Article" } }),
    ];
    let addr = serve(|_| invenio_app(state.clone())).await;

    let response = invenio_transport(addr)
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(!response.success);
    assert!(matches!(
        response.error,
        Some(TransportError::AmbiguousDraft { matches: 2, .. })
    ));
    let state = state.lock().unwrap();
    assert!(state.deleted.is_empty());
    assert!(state.uploads.is_empty());
}

fn sftp_transport(port: u16) -> Transport {
    transport(TransportConfig::Sftp {
        host: "127.0.0.1".into(),
        port,
        username: "depositor".into(),
        password: "secret".into(),
        directory: "incoming".into(),
    })
}

#[test_log::test(tokio::test)]
async fn sftp_connectivity_is_a_tcp_connect() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let transport = sftp_transport(port);
    assert_eq!(transport.protocol(), Protocol::Sftp);
    assert!(transport.check_connectivity(&no_hints()).await);

    drop(listener);
    assert!(!transport.check_connectivity(&no_hints()).await);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn sftp_send_to_a_server_that_does_not_speak_ssh() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            use tokio::io::AsyncWriteExt as _;
            let _ = socket.write_all(b"220 not an ssh server\r\n").await;
        }
    });

    let response = sftp_transport(port)
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(!response.success);
    assert!(
        matches!(response.error, Some(TransportError::Ssh { .. })),
        "{:?}",
        response.error
    );
    assert!(!package.is_opened());
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn sftp_send_to_a_closed_port_is_an_io_error() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = closed.local_addr().unwrap().port();
    drop(closed);

    let response = sftp_transport(port)
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(!response.success);
    assert!(matches!(response.error, Some(TransportError::Io { .. })));
    assert!(!package.is_opened());
}

#[derive(Default)]
struct DSpaceState {
    created: usize,
    upload: Vec<u8>,
    patches: Vec<Value>,
    workflow: Vec<String>,
    titled: bool,
    reject_workflow: bool,
}

type DSpace = Arc<Mutex<DSpaceState>>;

fn workspace_item(titled: bool) -> Value {
    let metadata = if titled {
        json!({ "dc.title": [ { "value": "My Article" } ] })
    } else {
        json!({})
    };
    json!({ "id": 7, "_embedded": { "item": { "uuid": "item-uuid", "metadata": metadata } } })
}

fn dspace_app(state: DSpace) -> Router {
    Router::new()
        .route(
            "/server/api/security/csrf",
            get(|| async { (StatusCode::NOT_FOUND, [("DSPACE-XSRF-TOKEN", "xsrf-1")]) }),
        )
        .route(
            "/server/api/authn/login",
            post(|headers: HeaderMap, body: String| async move {
                assert_eq!(headers["x-xsrf-token"], "xsrf-1");
                assert!(body.contains("user=depositor"));
                (StatusCode::OK, [("Authorization", "Bearer jwt-1")])
            }),
        )
        .route(
            "/server/api/discover/search/objects",
            get(|| async {
                Json(json!({ "_embedded": { "searchResult": { "_embedded": { "objects": [
                    { "_embedded": { "indexableObject": { "uuid": "coll-uuid", "handle": "123456789/2" } } }
                ] } } } }))
            }),
        )
        .route(
            "/server/api/submission/workspaceitems",
            post(|State(state): State<DSpace>, headers: HeaderMap, body: Bytes| async move {
                assert_eq!(headers["authorization"], "Bearer jwt-1");
                let mut state = state.lock().unwrap();
                state.created += 1;
                state.upload = body.to_vec();
                Json(json!({ "_embedded": { "workspaceitems": [ workspace_item(false) ] } }))
            }),
        )
        .route(
            "/server/api/submission/workspaceitems/:id",
            get(|State(state): State<DSpace>| async move {
                Json(workspace_item(state.lock().unwrap().titled))
            })
            .patch(|State(state): State<DSpace>, Json(ops): Json<Value>| async move {
                state.lock().unwrap().patches.push(ops);
                StatusCode::OK
            }),
        )
        .route(
            "/server/api/workflow/workflowitems",
            post(|State(state): State<DSpace>, body: String| async move {
                let mut state = state.lock().unwrap();
                if state.reject_workflow {
                    return StatusCode::UNPROCESSABLE_ENTITY;
                }
                state.workflow.push(body);
                StatusCode::CREATED
            }),
        )
        .with_state(state)
}

fn dspace_transport(addr: std::net::SocketAddr) -> Transport {
    transport(TransportConfig::DSpace {
        api_url: format!("http://{addr}/server/api").parse().unwrap(),
        website_url: "https://dspace.example.org".parse().unwrap(),
        username: "depositor".into(),
        password: "secret".into(),
        collection_handle: "123456789/2".into(),
    })
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn dspace_creates_patches_and_submits() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let state = DSpace::default();
    let addr = serve(|_| dspace_app(state.clone())).await;

    let transport = dspace_transport(addr);
    let response = transport
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.status_ref.as_deref(), Some("wsi:7"));
    assert_eq!(
        response.on_success,
        Some(OnSuccess::Complete {
            access_url: "https://dspace.example.org/items/item-uuid".parse().unwrap(),
        })
    );

    let state = state.lock().unwrap();
    assert_eq!(state.created, 1);
    let upload = String::from_utf8_lossy(&state.upload);
    assert!(upload.contains("filename=\"manuscript.pdf\""));
    assert!(upload.contains("filename=\"data.csv\""));
    assert_eq!(state.patches.len(), 1);
    assert!(
        state.patches[0]
            .as_array()
            .unwrap()
            .iter()
            .any(|op| op["path"] == "/sections/traditionalpageone/dc.title")
    );
    assert_eq!(
        state.workflow,
        vec![format!("http://{addr}/server/api/submission/workspaceitems/7")]
    );
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn dspace_resumes_existing_workspace_item() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let state = DSpace::default();
    state.lock().unwrap().titled = true;
    let addr = serve(|_| dspace_app(state.clone())).await;

    let hints = BTreeMap::from([(STATUS_REF_HINT.to_owned(), "wsi:7".to_owned())]);
    let response = dspace_transport(addr)
        .open(&hints)
        .await
        .unwrap()
        .send(&package, &hints)
        .await;
    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.status_ref.as_deref(), Some("wsi:7"));

    let state = state.lock().unwrap();
    assert_eq!(state.created, 0);
    assert!(state.patches.is_empty());
    assert_eq!(state.workflow.len(), 1);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn dspace_failure_after_creation_keeps_status_ref() {
    let fixture = fixture();
    let package = package(&fixture).await;
    let state = DSpace::default();
    state.lock().unwrap().reject_workflow = true;
    let addr = serve(|_| dspace_app(state.clone())).await;

    let response = dspace_transport(addr)
        .open(&no_hints())
        .await
        .unwrap()
        .send(&package, &no_hints())
        .await;
    assert!(!response.success);
    assert_eq!(response.status_ref.as_deref(), Some("wsi:7"));
}
