use std::fs;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use predicates::prelude::*;

type Hits = Arc<Mutex<Vec<String>>>;

fn spawn_steam_stub() -> (String, Hits, mpsc::Sender<()>, thread::JoinHandle<()>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let addr = server.server_addr();
    let base_url = format!("http://{addr}");

    let hits: Hits = Arc::new(Mutex::new(Vec::new()));
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let recorded = hits.clone();
    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let url = request.url().to_string();
            recorded.lock().unwrap().push(url.clone());

            let path = url.split('?').next().unwrap_or(&url);
            let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");

            let (status, body) = match path {
                "/applist" => (200, applist_body()),
                "/appdetails" => {
                    let appid = query
                        .split('&')
                        .find_map(|kv| kv.strip_prefix("appids="))
                        .unwrap_or("");
                    (200, appdetails_body(appid))
                }
                "/search" => (200, search_body()),
                _ => (404, "not found".to_owned()),
            };

            let header = tiny_http::Header::from_bytes(
                &b"Content-Type"[..],
                &b"application/json; charset=utf-8"[..],
            )
            .expect("build header");
            let response = tiny_http::Response::from_string(body)
                .with_status_code(status)
                .with_header(header);
            let _ = request.respond(response);
        }
    });

    (base_url, hits, shutdown_tx, handle)
}

fn applist_body() -> String {
    serde_json::json!({
        "applist": { "apps": { "app": [
            { "appid": 400, "name": "Portal" },
            { "appid": 12345, "name": "Brütal Legend" },
            { "appid": 1, "name": "Duplicate Game" },
            { "appid": 2, "name": "Duplicate-Game" }
        ] } }
    })
    .to_string()
}

fn appdetails_body(appid: &str) -> String {
    let with_cards = matches!(appid, "12345" | "777");
    let known = matches!(appid, "12345" | "777" | "99" | "400");

    if !known {
        return serde_json::json!({ appid: { "success": false } }).to_string();
    }

    let categories = if with_cards {
        serde_json::json!([{ "id": 29, "description": "Steam Trading Cards" }])
    } else {
        serde_json::json!([{ "id": 2, "description": "Single-player" }])
    };
    serde_json::json!({
        appid: { "success": true, "data": { "categories": categories } }
    })
    .to_string()
}

fn search_body() -> String {
    serde_json::json!({
        "searchInformation": { "totalResults": "1" },
        "items": [{
            "title": "Duplicate Game on Steam",
            "link": "https://store.steampowered.com/app/777/Duplicate_Game/"
        }]
    })
    .to_string()
}

fn count_hits(hits: &Hits, prefix: &str) -> usize {
    hits.lock()
        .unwrap()
        .iter()
        .filter(|url| url.starts_with(prefix))
        .count()
}

#[test]
fn offline_scan_resolves_exports_and_reruns_without_new_requests() -> anyhow::Result<()> {
    let (base_url, hits, shutdown_tx, server_handle) = spawn_steam_stub();
    let temp = tempfile::TempDir::new()?;

    let input_path = temp.path().join("input.csv");
    fs::write(&input_path, "Brütal Legend\nUnknown Game\nMyGame,99,TRUE\n")?;

    let out_path = temp.path().join("out.csv");
    let cache_path = temp.path().join("cache").join("applist.json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cardscan");
    cmd.args([
        "scan",
        "--input",
        input_path.to_str().unwrap(),
        "--out",
        out_path.to_str().unwrap(),
        "--cache",
        cache_path.to_str().unwrap(),
        "--catalog-url",
        &format!("{base_url}/applist"),
        "--details-url",
        &format!("{base_url}/appdetails"),
        "--offline",
        "--delay-ms",
        "0",
        "--rest-ms",
        "0",
    ])
    .assert()
    .success();

    let out = fs::read_to_string(&out_path)?;
    let rows: Vec<&str> = out.lines().collect();
    assert_eq!(
        rows,
        vec!["Brütal Legend,12345,TRUE", "Unknown Game,,", "MyGame,99,TRUE"]
    );

    assert_eq!(count_hits(&hits, "/applist"), 1);
    // Only "Brütal Legend" needed a details fetch: "MyGame" was already
    // known and "Unknown Game" never resolved.
    assert_eq!(count_hits(&hits, "/appdetails"), 1);
    assert!(cache_path.exists(), "expected catalog cache to be written");

    // Feeding the output back in must skip all finished work.
    let out2_path = temp.path().join("out2.csv");
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cardscan");
    cmd.args([
        "scan",
        "--input",
        out_path.to_str().unwrap(),
        "--out",
        out2_path.to_str().unwrap(),
        "--cache",
        cache_path.to_str().unwrap(),
        "--catalog-url",
        &format!("{base_url}/applist"),
        "--details-url",
        &format!("{base_url}/appdetails"),
        "--offline",
        "--delay-ms",
        "0",
        "--rest-ms",
        "0",
    ])
    .assert()
    .success();

    assert_eq!(fs::read_to_string(&out2_path)?, out);
    assert_eq!(count_hits(&hits, "/applist"), 1, "catalog cache reused");
    assert_eq!(count_hits(&hits, "/appdetails"), 1, "no new fetches");

    // Existing outputs are not clobbered without --force.
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cardscan");
    cmd.args([
        "scan",
        "--input",
        input_path.to_str().unwrap(),
        "--out",
        out2_path.to_str().unwrap(),
        "--cache",
        cache_path.to_str().unwrap(),
        "--catalog-url",
        &format!("{base_url}/applist"),
        "--details-url",
        &format!("{base_url}/appdetails"),
        "--offline",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("already exists"));

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();

    Ok(())
}

#[test]
fn blank_status_is_retried_on_the_next_pass() -> anyhow::Result<()> {
    let (base_url, hits, shutdown_tx, server_handle) = spawn_steam_stub();
    let temp = tempfile::TempDir::new()?;

    let input_path = temp.path().join("input.csv");
    fs::write(&input_path, "MyGame,99,\n")?;
    let out_path = temp.path().join("out.csv");
    let cache_path = temp.path().join("applist.json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cardscan");
    cmd.args([
        "scan",
        "--input",
        input_path.to_str().unwrap(),
        "--out",
        out_path.to_str().unwrap(),
        "--cache",
        cache_path.to_str().unwrap(),
        "--catalog-url",
        &format!("{base_url}/applist"),
        "--details-url",
        &format!("{base_url}/appdetails"),
        "--offline",
        "--delay-ms",
        "0",
        "--rest-ms",
        "0",
    ])
    .assert()
    .success();

    let out = fs::read_to_string(&out_path)?;
    assert_eq!(out.lines().collect::<Vec<_>>(), vec!["MyGame,99,FALSE"]);
    assert_eq!(count_hits(&hits, "/appdetails?appids=99"), 1);

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();

    Ok(())
}

#[test]
fn ambiguous_names_defer_to_search_when_credentials_exist() -> anyhow::Result<()> {
    let (base_url, hits, shutdown_tx, server_handle) = spawn_steam_stub();
    let temp = tempfile::TempDir::new()?;

    let input_path = temp.path().join("input.csv");
    fs::write(&input_path, "Duplicate Game\n")?;
    let cache_path = temp.path().join("applist.json");

    let config_path = temp.path().join("config.json");
    fs::write(
        &config_path,
        format!(r#"{{"key":"test-key","cx":"test-cx","endpoint":"{base_url}/search"}}"#),
    )?;

    let out_path = temp.path().join("out.csv");
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cardscan");
    cmd.args([
        "scan",
        "--input",
        input_path.to_str().unwrap(),
        "--out",
        out_path.to_str().unwrap(),
        "--cache",
        cache_path.to_str().unwrap(),
        "--catalog-url",
        &format!("{base_url}/applist"),
        "--details-url",
        &format!("{base_url}/appdetails"),
        "--config",
        config_path.to_str().unwrap(),
        "--delay-ms",
        "0",
        "--rest-ms",
        "0",
    ])
    .assert()
    .success();

    let out = fs::read_to_string(&out_path)?;
    assert_eq!(out.lines().collect::<Vec<_>>(), vec!["Duplicate Game,777,TRUE"]);
    assert_eq!(count_hits(&hits, "/search"), 1);
    assert_eq!(count_hits(&hits, "/appdetails?appids=777"), 1);

    // A placeholder key means search is disabled, and the ambiguous name
    // stays unresolved instead of guessing one of the catalog entries.
    let placeholder_config = temp.path().join("placeholder.json");
    fs::write(
        &placeholder_config,
        format!(r#"{{"key":"123","cx":"test-cx","endpoint":"{base_url}/search"}}"#),
    )?;

    let out_disabled = temp.path().join("out_disabled.csv");
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cardscan");
    cmd.args([
        "scan",
        "--input",
        input_path.to_str().unwrap(),
        "--out",
        out_disabled.to_str().unwrap(),
        "--cache",
        cache_path.to_str().unwrap(),
        "--catalog-url",
        &format!("{base_url}/applist"),
        "--details-url",
        &format!("{base_url}/appdetails"),
        "--config",
        placeholder_config.to_str().unwrap(),
        "--delay-ms",
        "0",
        "--rest-ms",
        "0",
    ])
    .assert()
    .success();

    let out = fs::read_to_string(&out_disabled)?;
    assert_eq!(out.lines().collect::<Vec<_>>(), vec!["Duplicate Game,,"]);
    assert_eq!(count_hits(&hits, "/search"), 1, "search must stay disabled");

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();

    Ok(())
}

#[test]
fn missing_catalog_is_a_decision_point() -> anyhow::Result<()> {
    let (base_url, _hits, shutdown_tx, server_handle) = spawn_steam_stub();
    let temp = tempfile::TempDir::new()?;

    let input_path = temp.path().join("input.csv");
    fs::write(&input_path, "Brütal Legend\n")?;
    let cache_path = temp.path().join("applist.json");

    let out_path = temp.path().join("out.csv");
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cardscan");
    cmd.args([
        "scan",
        "--input",
        input_path.to_str().unwrap(),
        "--out",
        out_path.to_str().unwrap(),
        "--cache",
        cache_path.to_str().unwrap(),
        "--catalog-url",
        &format!("{base_url}/no-such-endpoint"),
        "--details-url",
        &format!("{base_url}/appdetails"),
        "--offline",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("load app catalog"));

    // With the explicit opt-in the scan proceeds, just without ids.
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cardscan");
    cmd.args([
        "scan",
        "--input",
        input_path.to_str().unwrap(),
        "--out",
        out_path.to_str().unwrap(),
        "--cache",
        cache_path.to_str().unwrap(),
        "--catalog-url",
        &format!("{base_url}/no-such-endpoint"),
        "--details-url",
        &format!("{base_url}/appdetails"),
        "--offline",
        "--allow-missing-catalog",
        "--delay-ms",
        "0",
        "--rest-ms",
        "0",
    ])
    .assert()
    .success();

    let out = fs::read_to_string(&out_path)?;
    assert_eq!(out.lines().collect::<Vec<_>>(), vec!["Brütal Legend,,"]);

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();

    Ok(())
}

#[test]
fn catalog_refresh_overwrites_the_cache() -> anyhow::Result<()> {
    let (base_url, hits, shutdown_tx, server_handle) = spawn_steam_stub();
    let temp = tempfile::TempDir::new()?;

    let cache_path = temp.path().join("applist.json");
    fs::write(&cache_path, "stale")?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cardscan");
    cmd.args([
        "catalog",
        "refresh",
        "--cache",
        cache_path.to_str().unwrap(),
        "--catalog-url",
        &format!("{base_url}/applist"),
    ])
    .assert()
    .success();

    assert_eq!(count_hits(&hits, "/applist"), 1);
    let cached = fs::read_to_string(&cache_path)?;
    assert!(cached.contains("Brütal Legend"));

    let _ = shutdown_tx.send(());
    let _ = server_handle.join();

    Ok(())
}
