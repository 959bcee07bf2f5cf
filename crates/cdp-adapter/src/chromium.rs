use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::{Cdp, ElementRef, ElementState, QueryScope};

const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
window.chrome = window.chrome || { runtime: {} };
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
"#;

const PROBE_FN: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    const visible = rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
    return JSON.stringify({
        visible: visible,
        enabled: !this.disabled && this.getAttribute('aria-disabled') !== 'true',
        aria_label: this.getAttribute('aria-label'),
        title: this.getAttribute('title'),
        text: (this.innerText || this.textContent || '').trim().slice(0, 200)
    });
}"#;

const SCRIPT_CLICK_FN: &str = "function() { this.click(); return true; }";

/// Elements issued in the current page generation.
#[derive(Default)]
struct ElementArena {
    generation: u64,
    slots: Vec<Arc<Element>>,
}

impl ElementArena {
    fn advance(&mut self) {
        self.generation += 1;
        self.slots.clear();
    }

    fn issue(&mut self, element: Element) -> ElementRef {
        let slot = self.slots.len() as u32;
        self.slots.push(Arc::new(element));
        ElementRef::new(self.generation, slot)
    }

    fn get(&self, element: ElementRef) -> Result<Arc<Element>, AdapterError> {
        if !element.is_current(self.generation) {
            return Err(AdapterError::stale(element.generation, self.generation));
        }
        self.slots
            .get(element.slot as usize)
            .cloned()
            .ok_or_else(|| {
                AdapterError::new(AdapterErrorKind::TargetNotFound)
                    .with_hint(format!("no element in slot {}", element.slot))
            })
    }
}

/// Chromium-backed page driver owning one browser process and one tab.
pub struct ChromiumDriver {
    browser: tokio::sync::Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    /// Cleared when the protocol handler stops, i.e. the browser is gone.
    connected: Arc<AtomicBool>,
    arena: Mutex<ElementArena>,
}

impl ChromiumDriver {
    /// Launch a browser for one agent and open its working tab.
    pub async fn launch(cfg: &CdpConfig) -> Result<Self, AdapterError> {
        let browser_cfg = browser_config(cfg)?;
        let (mut browser, mut handler) = Browser::launch(browser_cfg).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch)
                .with_hint(format!("failed to launch chromium: {err}"))
        })?;

        let connected = Arc::new(AtomicBool::new(true));
        let alive = Arc::clone(&connected);
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(target: "cdp-adapter", %err, "browser handler stopped");
                    break;
                }
            }
            alive.store(false, Ordering::Release);
            warn!(target: "cdp-adapter", "browser connection closed");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(AdapterError::new(AdapterErrorKind::Launch)
                    .with_hint(format!("failed to open tab: {err}")));
            }
        };

        if cfg.stealth {
            if let Err(err) = page
                .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
                .await
            {
                warn!(target: "cdp-adapter", %err, "stealth script not installed");
            }
        }

        info!(
            target: "cdp-adapter",
            profile = %cfg.user_data_dir.display(),
            headless = cfg.headless,
            "chromium session ready"
        );

        Ok(Self {
            browser: tokio::sync::Mutex::new(Some(browser)),
            page,
            handler,
            connected,
            arena: Mutex::new(ElementArena::default()),
        })
    }

    fn arena(&self) -> MutexGuard<'_, ElementArena> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_connected(&self) -> Result<(), AdapterError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(AdapterError::session_lost("browser connection closed"))
        }
    }

    fn element(&self, element: ElementRef) -> Result<Arc<Element>, AdapterError> {
        self.ensure_connected()?;
        self.arena().get(element)
    }

    fn issue_all(&self, elements: Vec<Element>) -> Vec<ElementRef> {
        let mut arena = self.arena();
        elements.into_iter().map(|el| arena.issue(el)).collect()
    }
}

#[async_trait]
impl Cdp for ChromiumDriver {
    async fn navigate(&self, url: &str, deadline: Duration) -> Result<(), AdapterError> {
        self.ensure_connected()?;
        self.invalidate_handles();
        debug!(target: "cdp-adapter", url, "navigate");
        match tokio::time::timeout(deadline, self.page.goto(url.to_string())).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(AdapterError::from(err).with_data(json!({ "url": url }))),
            Err(_) => Err(AdapterError::new(AdapterErrorKind::NavTimeout)
                .with_hint(format!("{url} did not load within {deadline:?}"))
                .retriable(true)),
        }
    }

    async fn current_url(&self) -> Result<String, AdapterError> {
        self.ensure_connected()?;
        Ok(self.page.url().await?.unwrap_or_default())
    }

    fn generation(&self) -> u64 {
        self.arena().generation
    }

    fn invalidate_handles(&self) {
        self.arena().advance();
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn query(
        &self,
        scope: QueryScope,
        selector: &str,
    ) -> Result<Vec<ElementRef>, AdapterError> {
        self.ensure_connected()?;
        let found = match scope {
            QueryScope::Document => self.page.find_elements(selector).await,
            QueryScope::Within(parent) => self.element(parent)?.find_elements(selector).await,
        };
        match found {
            Ok(elements) => Ok(self.issue_all(elements)),
            // No match is reported as an error by the protocol layer.
            Err(chromiumoxide::error::CdpError::NotFound) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn attribute(
        &self,
        element: ElementRef,
        name: &str,
    ) -> Result<Option<String>, AdapterError> {
        Ok(self.element(element)?.attribute(name).await?)
    }

    async fn probe(&self, element: ElementRef) -> Result<ElementState, AdapterError> {
        let returns = self.element(element)?.call_js_fn(PROBE_FN, false).await?;
        match returns.result.value {
            Some(Value::String(raw)) => serde_json::from_str(&raw).map_err(|err| {
                AdapterError::new(AdapterErrorKind::Script)
                    .with_hint(format!("unreadable probe result: {err}"))
            }),
            other => Err(AdapterError::new(AdapterErrorKind::Script)
                .with_hint("probe returned no value")
                .with_data(other.unwrap_or(Value::Null))),
        }
    }

    async fn click(&self, element: ElementRef) -> Result<(), AdapterError> {
        self.element(element)?.click().await.map_err(|err| {
            let err = AdapterError::from(err);
            if err.kind == AdapterErrorKind::SessionLost {
                return err;
            }
            AdapterError::new(AdapterErrorKind::NotInteractable).with_hint(err.to_string())
        })?;
        Ok(())
    }

    async fn script_click(&self, element: ElementRef) -> Result<(), AdapterError> {
        self.element(element)?
            .call_js_fn(SCRIPT_CLICK_FN, false)
            .await?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, AdapterError> {
        self.ensure_connected()?;
        let result = self.page.evaluate(expression).await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.invalidate_handles();
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        if let Err(err) = browser.close().await {
            warn!(target: "cdp-adapter", %err, "browser close failed");
        }
        if let Err(err) = browser.wait().await {
            warn!(target: "cdp-adapter", %err, "browser did not exit cleanly");
        }
        self.handler.abort();
        info!(target: "cdp-adapter", "chromium session closed");
        Ok(())
    }
}

fn browser_config(cfg: &CdpConfig) -> Result<BrowserConfig, AdapterError> {
    let executable = cfg.resolved_executable().ok_or_else(|| {
        AdapterError::new(AdapterErrorKind::Launch)
            .with_hint("no chrome/chromium executable found")
            .with_data(json!({
                "expected": cfg.executable,
                "hint": "Set SOCKPUPPET_CHROME to the full path of chrome/chromium."
            }))
    })?;

    let profile_dir = if cfg.user_data_dir.is_absolute() {
        cfg.user_data_dir.clone()
    } else {
        let cwd = std::env::current_dir().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("failed to resolve cwd for user-data-dir: {err}"))
        })?;
        cwd.join(&cfg.user_data_dir)
    };
    fs::create_dir_all(&profile_dir).map_err(|err| {
        AdapterError::new(AdapterErrorKind::Launch)
            .with_hint(format!("failed to ensure user-data-dir: {err}"))
    })?;

    let mut builder = BrowserConfig::builder()
        .request_timeout(Duration::from_millis(cfg.default_deadline_ms))
        .launch_timeout(Duration::from_millis(cfg.launch_timeout_ms))
        .window_size(cfg.window_width, cfg.window_height);

    if !cfg.headless {
        builder = builder.with_head();
    }
    if cfg.no_sandbox {
        builder = builder.no_sandbox();
    }

    let mut args = vec![
        "--disable-background-networking".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-breakpad".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-extensions".to_string(),
        "--disable-popup-blocking".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--password-store=basic".to_string(),
        "--autoplay-policy=no-user-gesture-required".to_string(),
        format!("--lang={}", cfg.lang),
        format!("--user-agent={}", cfg.user_agent),
    ];
    if cfg.headless {
        args.push("--headless=new".to_string());
        args.push("--mute-audio".to_string());
    }

    builder
        .args(args)
        .chrome_executable(executable)
        .user_data_dir(profile_dir)
        .build()
        .map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("browser config error: {err}"))
        })
}
