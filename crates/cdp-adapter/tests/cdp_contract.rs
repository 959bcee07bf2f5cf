//! Contract tests against a real Chromium binary. Ignored by default because
//! they need Chrome/Chromium on the host.

use std::env;
use std::time::Duration;

use cdp_adapter::{Cdp, CdpConfig, ChromiumDriver, QueryScope};

fn contract_enabled() -> bool {
    env::var("SOCKPUPPET_CDP_CONTRACT")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

async fn launch(profile: &std::path::Path) -> ChromiumDriver {
    let cfg = CdpConfig {
        headless: true,
        ..CdpConfig::default()
    }
    .with_profile(profile);
    ChromiumDriver::launch(&cfg).await.expect("launch chromium")
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set SOCKPUPPET_CDP_CONTRACT=1"]
async fn contract_navigate_query_and_probe() {
    if !contract_enabled() {
        eprintln!("skipping CDP contract test (SOCKPUPPET_CDP_CONTRACT not enabled)");
        return;
    }

    let profile = tempfile::tempdir().unwrap();
    let driver = launch(profile.path()).await;
    driver
        .navigate("https://example.com", Duration::from_secs(15))
        .await
        .expect("navigate succeeds");

    let links = driver
        .query(QueryScope::Document, "a")
        .await
        .expect("query succeeds");
    assert!(!links.is_empty());
    let state = driver.probe(links[0]).await.expect("probe succeeds");
    assert!(state.visible);

    let before = driver.generation();
    driver
        .navigate("https://example.com", Duration::from_secs(15))
        .await
        .unwrap();
    assert!(driver.generation() > before);
    assert!(driver.click(links[0]).await.unwrap_err().is_stale());

    driver.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set SOCKPUPPET_CDP_CONTRACT=1"]
async fn contract_stealth_hides_webdriver_flag() {
    if !contract_enabled() {
        eprintln!("skipping CDP contract test (SOCKPUPPET_CDP_CONTRACT not enabled)");
        return;
    }

    let profile = tempfile::tempdir().unwrap();
    let driver = launch(profile.path()).await;
    driver
        .navigate("https://example.com", Duration::from_secs(15))
        .await
        .unwrap();
    let flag = driver
        .evaluate("navigator.webdriver === undefined")
        .await
        .unwrap();
    assert_eq!(flag, serde_json::Value::Bool(true));
    driver.close().await.unwrap();
}
