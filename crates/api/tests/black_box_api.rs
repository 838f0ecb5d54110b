use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use stocktrail_infra::config::AppConfig;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod) over a throwaway storage root,
        // bound to an ephemeral port.
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let app = stocktrail_api::app::build_app(&config).expect("failed to build app");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            handle,
            _dir: dir,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn ids() -> (Uuid, Uuid) {
    (Uuid::now_v7(), Uuid::now_v7())
}

async fn add_stock(
    client: &reqwest::Client,
    base_url: &str,
    product_id: Uuid,
    store_id: Uuid,
    quantity: i64,
) -> reqwest::Response {
    client
        .post(format!("{base_url}/api/v1/inventory/stock"))
        .json(&json!({
            "product_id": product_id,
            "store_id": store_id,
            "quantity": quantity,
            "reason": "restock",
        }))
        .send()
        .await
        .unwrap()
}

async fn reserve(
    client: &reqwest::Client,
    base_url: &str,
    product_id: Uuid,
    store_id: Uuid,
    quantity: i64,
) -> reqwest::Response {
    client
        .post(format!("{base_url}/api/v1/inventory/reserve"))
        .json(&json!({
            "product_id": product_id,
            "store_id": store_id,
            "quantity": quantity,
            "customer_id": Uuid::now_v7(),
            "ttl_minutes": 30,
        }))
        .send()
        .await
        .unwrap()
}

async fn get_stock(
    client: &reqwest::Client,
    base_url: &str,
    product_id: Uuid,
    store_id: Uuid,
) -> reqwest::Response {
    client
        .get(format!(
            "{base_url}/api/v1/inventory/products/{product_id}/stores/{store_id}"
        ))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_and_root_respond() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(&srv.base_url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["service"], "stocktrail");
}

#[tokio::test]
async fn add_stock_then_get_returns_the_levels() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (p, s) = ids();

    let res = add_stock(&client, &srv.base_url, p, s, 100).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = get_stock(&client, &srv.base_url, p, s).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["available"], 100);
    assert_eq!(body["reserved"], 0);
    assert_eq!(body["total"], 100);
}

#[tokio::test]
async fn reserve_commit_flow() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (p, s) = ids();

    add_stock(&client, &srv.base_url, p, s, 100).await;

    let res = reserve(&client, &srv.base_url, p, s, 10).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let reservation_id = body["reservation_id"].as_str().unwrap().to_string();

    let body: serde_json::Value = get_stock(&client, &srv.base_url, p, s)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["available"], 90);
    assert_eq!(body["reserved"], 10);
    assert_eq!(body["total"], 100);

    let res = client
        .post(format!("{}/api/v1/inventory/commit", srv.base_url))
        .json(&json!({
            "product_id": p,
            "store_id": s,
            "reservation_id": reservation_id,
            "order_id": Uuid::now_v7(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = get_stock(&client, &srv.base_url, p, s)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["available"], 90);
    assert_eq!(body["reserved"], 0);
    assert_eq!(body["total"], 90);
}

#[tokio::test]
async fn reserve_release_flow_restores_stock() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (p, s) = ids();

    add_stock(&client, &srv.base_url, p, s, 100).await;

    let res = reserve(&client, &srv.base_url, p, s, 10).await;
    let body: serde_json::Value = res.json().await.unwrap();
    let reservation_id = body["reservation_id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/api/v1/inventory/release", srv.base_url))
        .json(&json!({
            "product_id": p,
            "store_id": s,
            "reservation_id": reservation_id,
            "reason": "cancel",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = get_stock(&client, &srv.base_url, p, s)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["available"], 100);
    assert_eq!(body["reserved"], 0);
}

#[tokio::test]
async fn reserving_beyond_available_is_409() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (p, s) = ids();

    let res = reserve(&client, &srv.base_url, p, s, 200).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
}

#[tokio::test]
async fn committing_an_unknown_reservation_is_404() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (p, s) = ids();

    add_stock(&client, &srv.base_url, p, s, 10).await;

    let res = client
        .post(format!("{}/api/v1/inventory/commit", srv.base_url))
        .json(&json!({
            "product_id": p,
            "store_id": s,
            "reservation_id": Uuid::now_v7(),
            "order_id": Uuid::now_v7(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "reservation_not_found");
}

#[tokio::test]
async fn zero_quantity_is_rejected_as_invalid() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (p, s) = ids();

    let res = add_stock(&client, &srv.base_url, p, s, 0).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_quantity");
}

#[tokio::test]
async fn ttl_minutes_out_of_range_is_422() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (p, s) = ids();

    add_stock(&client, &srv.base_url, p, s, 100).await;

    let res = client
        .post(format!("{}/api/v1/inventory/reserve", srv.base_url))
        .json(&json!({
            "product_id": p,
            "store_id": s,
            "quantity": 1,
            "customer_id": Uuid::now_v7(),
            "ttl_minutes": 2000,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_stock_is_404() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (p, s) = ids();

    let res = get_stock(&client, &srv.base_url, p, s).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_path_id_is_400() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/api/v1/inventory/products/not-a-uuid/stores/{}",
            srv.base_url,
            Uuid::now_v7()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn availability_endpoint_compares_to_threshold() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (p, s) = ids();

    add_stock(&client, &srv.base_url, p, s, 10).await;

    let res = client
        .post(format!("{}/api/v1/inventory/availability", srv.base_url))
        .json(&json!({
            "product_id": p,
            "store_id": s,
            "required_quantity": 5,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["available"], true);
    assert_eq!(body["current_stock"], 10);
    assert_eq!(body["required"], 5);

    let res = client
        .post(format!("{}/api/v1/inventory/availability", srv.base_url))
        .json(&json!({
            "product_id": p,
            "store_id": s,
            "required_quantity": 0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn product_inventory_lists_every_store() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let p = Uuid::now_v7();
    let s1 = Uuid::now_v7();
    let s2 = Uuid::now_v7();

    add_stock(&client, &srv.base_url, p, s1, 10).await;
    add_stock(&client, &srv.base_url, p, s2, 20).await;

    let res = client
        .get(format!("{}/api/v1/inventory/products/{}", srv.base_url, p))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);

    let res = client
        .get(format!(
            "{}/api/v1/inventory/products/{}",
            srv.base_url,
            Uuid::now_v7()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
