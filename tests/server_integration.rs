//! End-to-end tests for the JSON HTTP server.

use serde_json::{json, Value};
use shivaya_catalog::config::Config;
use shivaya_catalog::server::run_server;
use std::fs;
use tempfile::TempDir;

const PRODUCTS: &str = r#"[
  {"name": "Kadai", "category": "Kitchen World", "subcategory": "Cookware"},
  {"name": "Tawa", "category": "Kitchen World", "subcategory": "Cookware"},
  {"name": "Pressure Cooker", "category": "Kitchen World", "subcategory": "Cookware"},
  {"name": "Astral Pen", "category": "Metal Pens", "subcategory": "Astral Series"}
]"#;

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn test_config(tmp: &TempDir, port: u16) -> Config {
    let data = tmp.path().join("products.json");
    fs::write(&data, PRODUCTS).unwrap();
    let config_content = format!(
        r#"
[[catalog.sources]]
name = "products"
path = "{}"

[[catalog.sources]]
name = "offline"
url = "http://127.0.0.1:9/products.json"

[server]
bind = "127.0.0.1:{}"
"#,
        data.display(),
        port
    );
    toml::from_str(&config_content).unwrap()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn start(tmp: &TempDir) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let cfg = test_config(tmp, port);
    let handle = tokio::spawn(async move {
        run_server(&cfg).await.ok();
    });
    wait_for_server(port).await;
    (format!("http://127.0.0.1:{}", port), handle)
}

#[tokio::test]
async fn test_health_reports_partial_load() {
    let tmp = TempDir::new().unwrap();
    let (base, handle) = start(&tmp).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["products"], 4);
    assert!(body.get("catalog_error").is_none());
    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources[0]["ok"], true);
    assert_eq!(sources[1]["ok"], false);

    handle.abort();
}

#[tokio::test]
async fn test_catalog_and_search() {
    let tmp = TempDir::new().unwrap();
    let (base, handle) = start(&tmp).await;

    let catalog: Value = reqwest::get(format!("{}/api/catalog", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let kitchen = &catalog["categories"][0];
    assert_eq!(kitchen["name"], "Kitchen World");
    assert_eq!(kitchen["subcategories"][0]["products"].as_array().unwrap().len(), 3);

    let body: Value = reqwest::get(format!("{}/api/search?q=tawa", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["results"][0]["type"], "product");
    assert_eq!(body["results"][0]["name"], "Tawa");

    let body: Value = reqwest::get(format!("{}/api/search?q=", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["results"], json!([]));

    let resp = reqwest::get(format!("{}/api/search?q=tawa&limit=0", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    handle.abort();
}

#[tokio::test]
async fn test_products_path_resolution() {
    let tmp = TempDir::new().unwrap();
    let (base, handle) = start(&tmp).await;

    let body: Value = reqwest::get(format!("{}/products/kitchen-world/cookware/tawa", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["state"]["layer"], "product");
    assert_eq!(body["state"]["selectedProduct"], "KI-CO-002");
    assert_eq!(body["view"]["kind"], "product");
    assert_eq!(body["view"]["product"]["name"], "Tawa");

    let body: Value = reqwest::get(format!("{}/products/metal-pens/missing", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["path"], "/products/metal-pens");
    assert_eq!(body["state"]["layer"], "subcategory");
    assert_eq!(body["view"]["kind"], "subcategories");

    let body: Value = reqwest::get(format!("{}/products", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["state"]["layer"], "category");
    assert_eq!(body["view"]["categories"].as_array().unwrap().len(), 2);

    handle.abort();
}

#[tokio::test]
async fn test_reload_picks_up_new_data() {
    let tmp = TempDir::new().unwrap();
    let (base, handle) = start(&tmp).await;

    fs::write(
        tmp.path().join("products.json"),
        r#"[{"name": "Bucket 20L", "category": "Household Products", "subcategory": "Bucket"}]"#,
    )
    .unwrap();

    let client = reqwest::Client::new();
    let resp = client.post(format!("{}/api/reload", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["products"], 1);

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["products"], 1);

    handle.abort();
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_catalog() {
    let tmp = TempDir::new().unwrap();
    let (base, handle) = start(&tmp).await;

    fs::remove_file(tmp.path().join("products.json")).unwrap();

    let client = reqwest::Client::new();
    let resp = client.post(format!("{}/api/reload", base)).send().await.unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "catalog_unavailable");

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["products"], 4);

    handle.abort();
}

#[tokio::test]
async fn test_contact_disabled_without_config() {
    let tmp = TempDir::new().unwrap();
    let (base, handle) = start(&tmp).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/contact", base))
        .json(&json!({
            "name": "Asha",
            "email": "asha@example.com",
            "message": "Quote for 500 crates",
            "productInterest": "Industrial Plastic Crates"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "contact_disabled");

    handle.abort();
}
