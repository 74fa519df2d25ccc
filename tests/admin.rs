mod common;

use axum::http::Method;
use common::{MockSolr, SOLR_OK, truncating_server};
use serde_json::json;
use solr_ltr::{Error, FeatureDefinition, SolrClient, SolrConfig};

#[tokio::test]
async fn create_collection_wipes_then_creates() {
    let solr = MockSolr::start(|req| {
        if req.form().get("action").map(String::as_str) == Some("delete") {
            (400, r#"{"error":{"msg":"Could not find collection"}}"#.into())
        } else {
            (200, SOLR_OK.into())
        }
    })
    .await;
    let client = SolrClient::new(solr.config()).unwrap();

    let status = client.create_collection("products").await.unwrap();
    assert!(status.success);

    let requests = solr.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.path == "/solr/admin/collections"));

    let wipe = requests[0].form();
    assert_eq!(wipe["action"], "delete");
    assert_eq!(wipe["name"], "products");

    let create = requests[1].form();
    assert_eq!(create["action"], "CREATE");
    assert_eq!(create["name"], "products");
    assert_eq!(create["numShards"], "1");
    assert_eq!(create["replicationFactor"], "1");
}

#[tokio::test]
async fn create_collection_failure_is_an_error() {
    let solr = MockSolr::fixed(500, "zookeeper unavailable").await;
    let client = SolrClient::new(solr.config()).unwrap();

    let err = client.create_collection("products").await.unwrap_err();
    assert!(matches!(err, Error::RequestFailed { status: 500, .. }));
    assert!(err.to_string().contains("zookeeper unavailable"));
}

#[tokio::test]
async fn non_zero_solr_status_is_reported_not_raised() {
    let solr =
        MockSolr::fixed(200, r#"{"responseHeader":{"status":1}}"#).await;
    let client = SolrClient::new(solr.config()).unwrap();

    let status = client.delete_collection("products").await.unwrap();
    assert!(!status.success);
    assert_eq!(status.body["responseHeader"]["status"], json!(1));
}

#[tokio::test]
async fn enable_ltr_registers_parser_and_transformer() {
    let solr = MockSolr::fixed(200, SOLR_OK).await;
    let client = SolrClient::new(solr.config()).unwrap();

    let setup = client.enable_ltr("tmdb").await.unwrap();
    assert!(setup.success());

    let requests = solr.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|r| r.path == "/solr/tmdb/config"));
    assert!(requests.iter().all(|r| r.method == Method::POST));

    assert_eq!(requests[0].json(), json!({"delete-queryparser": "ltr"}));
    assert_eq!(
        requests[1].json()["add-queryparser"]["class"],
        json!("org.apache.solr.ltr.search.LTRQParserPlugin")
    );
    assert_eq!(requests[2].json(), json!({"delete-transformer": "features"}));
    let transformer = &requests[3].json()["add-transformer"];
    assert_eq!(transformer["name"], json!("features"));
    assert_eq!(transformer["fvCacheName"], json!("QUERY_DOC_FV"));
}

#[tokio::test]
async fn field_upserts_delete_then_add() {
    let solr = MockSolr::fixed(200, SOLR_OK).await;
    let client = SolrClient::new(solr.config()).unwrap();

    client.upsert_text_field("products", "title").await.unwrap();
    client.upsert_integer_field("products", "sales").await.unwrap();

    let requests = solr.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|r| r.path == "/solr/products/schema"));

    assert_eq!(
        requests[0].json(),
        json!({"delete-field": {"name": "title"}})
    );
    let text = &requests[1].json()["add-field"];
    assert_eq!(text["name"], json!("title"));
    assert_eq!(text["type"], json!("text_general"));
    assert_eq!(text["stored"], json!(true));
    assert_eq!(text["multiValued"], json!(false));

    assert_eq!(
        requests[2].json(),
        json!({"delete-field": {"name": "sales"}})
    );
    assert_eq!(requests[3].json()["add-field"]["type"], json!("pint"));
}

#[tokio::test]
async fn upsert_tolerates_missing_field() {
    let solr = MockSolr::start(|req| {
        if req.body.contains("delete-field") {
            (400, r#"{"error":{"msg":"no such field"}}"#.into())
        } else {
            (200, SOLR_OK.into())
        }
    })
    .await;
    let client = SolrClient::new(solr.config()).unwrap();

    let status = client.upsert_text_field("products", "title").await.unwrap();
    assert!(status.success);
}

#[tokio::test]
async fn upload_feature_store_replaces_store() {
    let solr = MockSolr::fixed(200, SOLR_OK).await;
    let client = SolrClient::new(solr.config()).unwrap();

    let features = vec![
        FeatureDefinition {
            name: "title_bm25".into(),
            store: Some("other".into()),
            class: "org.apache.solr.ltr.feature.SolrFeature".into(),
            params: json!({"q": "title:(${keywords})"}),
        },
        FeatureDefinition {
            name: "original_score".into(),
            store: None,
            class: "org.apache.solr.ltr.feature.OriginalScoreFeature".into(),
            params: json!({}),
        },
    ];
    client
        .upload_feature_store("tmdb", "release", &features)
        .await
        .unwrap();

    let requests = solr.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::DELETE);
    assert_eq!(requests[0].path, "/solr/tmdb/schema/feature-store/release");
    assert_eq!(requests[1].method, Method::PUT);
    assert_eq!(requests[1].path, "/solr/tmdb/schema/feature-store");

    let uploaded = requests[1].json();
    let uploaded = uploaded.as_array().unwrap();
    assert_eq!(uploaded.len(), 2);
    assert!(uploaded.iter().all(|f| f["store"] == json!("release")));
    assert_eq!(uploaded[0]["name"], json!("title_bm25"));
    assert_eq!(uploaded[1]["name"], json!("original_score"));
}

#[tokio::test]
async fn health_check_hits_system_info() {
    let solr = MockSolr::fixed(200, SOLR_OK).await;
    let client = SolrClient::new(solr.config()).unwrap();

    assert!(client.health_check().await.unwrap().success);
    let request = &solr.requests()[0];
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.path, "/solr/admin/info/system");
    assert_eq!(request.query.as_deref(), Some("wt=json"));
}

#[tokio::test]
async fn health_check_fails_when_unavailable() {
    let solr = MockSolr::fixed(503, "starting up").await;
    let client = SolrClient::new(solr.config()).unwrap();

    assert!(matches!(
        client.health_check().await,
        Err(Error::RequestFailed { status: 503, .. })
    ));
}

#[tokio::test]
async fn unreadable_error_body_still_reports_status() {
    let base = truncating_server(500).await;
    let config = SolrConfig::from_base_url(&format!("{base}/solr")).unwrap();
    let client = SolrClient::new(config).unwrap();

    match client.health_check().await {
        Err(Error::RequestFailed {
            label,
            status,
            body,
        }) => {
            assert_eq!(label, "Health check");
            assert_eq!(status, 500);
            assert!(body.is_empty());
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}
