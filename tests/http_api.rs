//! HTTP contract tests: spawn `leads serve` against a temporary storage
//! root and exercise the dashboard API with a real client.

use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn leads_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("leads");
    path
}

/// A running `leads serve` child process, killed on drop.
struct ServerGuard {
    child: Child,
    base_url: String,
    _tmp: TempDir,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn spawn_server(port: u16) -> ServerGuard {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    fs::create_dir_all(root.join("config")).unwrap();

    let config_path = root.join("config/leads.toml");
    fs::write(
        &config_path,
        format!(
            r#"[storage]
root = "{}/data/scrapes"

[server]
bind = "127.0.0.1:{}"
"#,
            root.display(),
            port
        ),
    )
    .unwrap();

    let child = Command::new(leads_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("serve")
        .spawn()
        .expect("failed to spawn leads serve");

    let base_url = format!("http://127.0.0.1:{}", port);

    // Wait for the server to come up.
    let deadline = Instant::now() + Duration::from_secs(15);
    loop {
        if let Ok(resp) = reqwest::blocking::get(format!("{}/health", base_url)) {
            if resp.status().is_success() {
                break;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become healthy on port {}", port);
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    ServerGuard {
        child,
        base_url,
        _tmp: tmp,
    }
}

fn upload(
    server: &ServerGuard,
    filename: &str,
    bytes: &[u8],
) -> reqwest::blocking::Response {
    let part = reqwest::blocking::multipart::Part::bytes(bytes.to_vec())
        .file_name(filename.to_string());
    let form = reqwest::blocking::multipart::Form::new().part("file", part);

    reqwest::blocking::Client::new()
        .post(format!("{}/scrapes/upload", server.base_url))
        .multipart(form)
        .send()
        .unwrap()
}

fn plumbing_csv(rows: usize) -> Vec<u8> {
    let mut csv = String::from("name,phone,city\n");
    for i in 0..rows {
        csv.push_str(&format!("Acme Plumbing {} LLC,555-01{:02},Austin\n", i, i));
    }
    csv.into_bytes()
}

#[test]
fn test_upload_list_and_stats_flow() {
    let server = spawn_server(7421);

    // Upload a classified file with 120 data rows plus header.
    let resp = upload(&server, "plumbing_leads_march.csv", &plumbing_csv(120));
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().unwrap();
    assert!(body["message"].as_str().unwrap().contains("120 records"));

    // It shows up in the listing with the derived industry.
    let body: serde_json::Value =
        reqwest::blocking::get(format!("{}/scrapes", server.base_url))
            .unwrap()
            .json()
            .unwrap();
    assert_eq!(body["total_records"], 120);
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "plumbing_leads_march.csv");
    assert_eq!(files[0]["records"], 120);
    assert_eq!(files[0]["industry"], "plumbing");
    assert!(files[0]["size"].as_u64().unwrap() > 0);
    assert!(files[0]["uploaded_at"].is_string());

    // Aggregate stats reflect the same numbers.
    let body: serde_json::Value =
        reqwest::blocking::get(format!("{}/scraper/stats", server.base_url))
            .unwrap()
            .json()
            .unwrap();
    assert_eq!(body["total_files"], 1);
    assert_eq!(body["total_records"], 120);
    assert_eq!(body["per_industry"]["plumbing"], 120);
}

#[test]
fn test_upload_validation_failures() {
    let server = spawn_server(7422);

    // Wrong extension: rejected, no state created.
    let resp = upload(&server, "notes.txt", b"name\nrow\n");
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().unwrap();
    assert!(body["detail"].as_str().unwrap().contains("accepted"));

    // Unparseable content: rejected, blob rolled back.
    let resp = upload(&server, "hvac.csv", b"\xff\xfe\x80 not csv");
    assert_eq!(resp.status(), 400);

    // Multipart body without a 'file' field.
    let form = reqwest::blocking::multipart::Form::new().text("other", "value");
    let resp = reqwest::blocking::Client::new()
        .post(format!("{}/scrapes/upload", server.base_url))
        .multipart(form)
        .send()
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value =
        reqwest::blocking::get(format!("{}/scrapes", server.base_url))
            .unwrap()
            .json()
            .unwrap();
    assert_eq!(body["files"].as_array().unwrap().len(), 0);
    assert_eq!(body["total_records"], 0);
}

#[test]
fn test_download_round_trip_and_missing() {
    let server = spawn_server(7423);

    let bytes = plumbing_csv(3);
    assert_eq!(upload(&server, "plumbing.csv", &bytes).status(), 201);

    let resp = reqwest::blocking::get(format!(
        "{}/scrapes/download/plumbing.csv",
        server.base_url
    ))
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap(),
        "attachment; filename=\"plumbing.csv\""
    );
    assert_eq!(resp.bytes().unwrap().to_vec(), bytes);

    let resp = reqwest::blocking::get(format!(
        "{}/scrapes/download/never_uploaded.csv",
        server.base_url
    ))
    .unwrap();
    assert_eq!(resp.status(), 404);
}

#[test]
fn test_delete_then_delete_again() {
    let server = spawn_server(7424);
    let client = reqwest::blocking::Client::new();

    assert_eq!(upload(&server, "roofing.csv", &plumbing_csv(2)).status(), 201);

    let resp = client
        .delete(format!("{}/scrapes/roofing.csv", server.base_url))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["message"], "Deleted roofing.csv");

    let resp = client
        .delete(format!("{}/scrapes/roofing.csv", server.base_url))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().unwrap();
    assert!(body["detail"].as_str().unwrap().contains("no such file"));
}

#[test]
fn test_list_filters_conjunctively() {
    let server = spawn_server(7425);

    assert_eq!(
        upload(&server, "plumbing_austin.csv", &plumbing_csv(1)).status(),
        201
    );
    assert_eq!(
        upload(&server, "plumbing_dallas.csv", &plumbing_csv(2)).status(),
        201
    );
    assert_eq!(
        upload(&server, "hvac_austin.csv", &plumbing_csv(3)).status(),
        201
    );

    let body: serde_json::Value = reqwest::blocking::get(format!(
        "{}/scrapes?search=austin&industry=plumbing",
        server.base_url
    ))
    .unwrap()
    .json()
    .unwrap();
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "plumbing_austin.csv");
    assert_eq!(body["total_records"], 1);

    // industry=all matches everything, search is case-insensitive.
    let body: serde_json::Value = reqwest::blocking::get(format!(
        "{}/scrapes?search=AUSTIN&industry=all",
        server.base_url
    ))
    .unwrap()
    .json()
    .unwrap();
    assert_eq!(body["files"].as_array().unwrap().len(), 2);

    // Unknown industry values are a client error, not an empty result.
    let resp = reqwest::blocking::get(format!(
        "{}/scrapes?industry=carpentry",
        server.base_url
    ))
    .unwrap();
    assert_eq!(resp.status(), 400);
}

#[test]
fn test_industries_endpoint_returns_vocabulary() {
    let server = spawn_server(7426);

    let body: serde_json::Value =
        reqwest::blocking::get(format!("{}/scraper/industries", server.base_url))
            .unwrap()
            .json()
            .unwrap();
    let industries = body["industries"].as_array().unwrap();
    assert_eq!(industries.len(), 8);
    assert_eq!(industries[0], "plumbing");
    assert!(industries.iter().any(|i| i == "power_washing"));
}

#[test]
fn test_path_parameters_are_url_decoded() {
    let server = spawn_server(7428);

    assert_eq!(
        upload(&server, "power wash austin.csv", &plumbing_csv(2)).status(),
        201
    );

    // The registry key is the decoded literal name.
    let resp = reqwest::blocking::get(format!(
        "{}/scrapes/download/power%20wash%20austin.csv",
        server.base_url
    ))
    .unwrap();
    assert_eq!(resp.status(), 200);

    let client = reqwest::blocking::Client::new();
    let resp = client
        .delete(format!(
            "{}/scrapes/power%20wash%20austin.csv",
            server.base_url
        ))
        .send()
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[test]
fn test_overwrite_reupload_reflects_second_content() {
    let server = spawn_server(7427);

    assert_eq!(upload(&server, "hvac.csv", &plumbing_csv(5)).status(), 201);
    assert_eq!(upload(&server, "hvac.csv", &plumbing_csv(9)).status(), 201);

    let body: serde_json::Value =
        reqwest::blocking::get(format!("{}/scrapes", server.base_url))
            .unwrap()
            .json()
            .unwrap();
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["records"], 9);
    assert_eq!(body["total_records"], 9);
}
