//! Playback protocol
//!
//! `Selecting → Verifying → Starting → ClearingAds → ClearingPrompts →
//! Holding → Done`. Playback is best effort: a failing engine call ends the
//! run early in `Done` instead of raising. The only error is
//! [`FlowError::Unavailable`], for items that cannot be opened or that the
//! player reports as unplayable.

use std::fmt;
use std::time::Duration;

use action_primitives::{ClickTarget, InteractionEngine, WaitCondition};
use serde::Serialize;
use sockpuppet_core_types::{ContentId, ContentItem};
use tracing::{debug, info, warn};

use crate::catalog::SelectorCatalog;
use crate::errors::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    Selecting,
    Verifying,
    Starting,
    ClearingAds,
    ClearingPrompts,
    Holding,
    Done,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What happened during one playback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackReport {
    pub id: ContentId,
    /// States entered, in order, ending with `Done`
    pub visited: Vec<PlaybackState>,
    pub player_ready: bool,
    pub play_clicked: bool,
    pub ad_probes: u32,
    pub ad_seen: bool,
    pub ad_skipped: bool,
    pub prompt_dismissed: bool,
    pub held: Duration,
    /// Error that ended the run early, if any
    pub aborted: Option<String>,
}

impl PlaybackReport {
    pub fn new(id: ContentId) -> Self {
        Self {
            id,
            visited: Vec::new(),
            player_ready: false,
            play_clicked: false,
            ad_probes: 0,
            ad_seen: false,
            ad_skipped: false,
            prompt_dismissed: false,
            held: Duration::ZERO,
            aborted: None,
        }
    }

    /// Reached `Holding` and waited the full duration.
    pub fn completed(&self) -> bool {
        self.aborted.is_none() && self.visited.contains(&PlaybackState::Holding)
    }
}

/// Outcome of one state handler.
enum Transition {
    Next(PlaybackState),
    Unavailable(String),
}

pub struct PlaybackController<'a> {
    engine: &'a InteractionEngine,
    catalog: &'a SelectorCatalog,
}

impl<'a> PlaybackController<'a> {
    pub fn new(engine: &'a InteractionEngine, catalog: &'a SelectorCatalog) -> Self {
        Self { engine, catalog }
    }

    /// Run the protocol for `item`, holding playback for `hold`.
    pub async fn play(
        &self,
        item: &ContentItem,
        hold: Duration,
    ) -> Result<PlaybackReport, FlowError> {
        let mut report = PlaybackReport::new(item.id.clone());
        let mut state = PlaybackState::Selecting;
        info!(id = %item.id, hold_secs = hold.as_secs(), "playback started");

        loop {
            report.visited.push(state);
            if state == PlaybackState::Done {
                break;
            }
            self.engine.ensure_session()?;
            state = match self.step(state, item, hold, &mut report).await {
                Ok(Transition::Next(next)) => next,
                Ok(Transition::Unavailable(reason)) => {
                    warn!(id = %item.id, %reason, "content unavailable");
                    return Err(FlowError::unavailable(&item.id, reason));
                }
                Err(err @ FlowError::SessionLost(_)) => {
                    warn!(id = %item.id, %state, "browser lost during playback");
                    return Err(err);
                }
                Err(err) => {
                    warn!(id = %item.id, %state, "playback ended early: {}", err);
                    report.aborted = Some(err.to_string());
                    PlaybackState::Done
                }
            };
        }

        debug!(id = %item.id, ?report, "playback finished");
        Ok(report)
    }

    async fn step(
        &self,
        state: PlaybackState,
        item: &ContentItem,
        hold: Duration,
        report: &mut PlaybackReport,
    ) -> Result<Transition, FlowError> {
        let timings = self.engine.timings();
        match state {
            PlaybackState::Selecting => {
                let target = ClickTarget::for_item(item, self.engine.generation());
                if let Err(err) = self.engine.click_with_fallback(&target).await {
                    if err.is_session_lost() {
                        return Err(err.into());
                    }
                    return Ok(Transition::Unavailable(format!("could not be opened: {err}")));
                }
                self.engine.pause_ms(timings.click_settle_ms).await;
                Ok(Transition::Next(PlaybackState::Verifying))
            }
            PlaybackState::Verifying => self.verify().await.map(|ready| match ready {
                Verification::Unavailable(reason) => Transition::Unavailable(reason),
                Verification::Ready(ready) => {
                    report.player_ready = ready;
                    Transition::Next(PlaybackState::Starting)
                }
            }),
            PlaybackState::Starting => {
                if let Some(button) = self
                    .engine
                    .find_first_visible_clickable(&self.catalog.play_buttons, &self.catalog.play_labels)
                    .await
                {
                    self.engine.press(button).await?;
                    report.play_clicked = true;
                } else {
                    debug!("no play control, assuming autoplay");
                }
                Ok(Transition::Next(PlaybackState::ClearingAds))
            }
            PlaybackState::ClearingAds => {
                self.clear_ads(report).await?;
                Ok(Transition::Next(PlaybackState::ClearingPrompts))
            }
            PlaybackState::ClearingPrompts => {
                let none: &[String] = &[];
                if let Some(button) = self
                    .engine
                    .find_first_visible_clickable(&self.catalog.prompt_buttons, none)
                    .await
                {
                    self.engine.press(button).await?;
                    report.prompt_dismissed = true;
                    self.engine.pause_ms(timings.prompt_settle_ms).await;
                }
                Ok(Transition::Next(PlaybackState::Holding))
            }
            PlaybackState::Holding => {
                tokio::time::sleep(hold).await;
                report.held = hold;
                Ok(Transition::Next(PlaybackState::Done))
            }
            PlaybackState::Done => Ok(Transition::Next(PlaybackState::Done)),
        }
    }

    async fn verify(&self) -> Result<Verification, FlowError> {
        let mut conditions: Vec<WaitCondition> = self
            .catalog
            .player_ready
            .iter()
            .map(WaitCondition::present)
            .collect();
        let ready_count = conditions.len();
        conditions.extend(self.catalog.unavailable.iter().map(WaitCondition::visible));

        let timeout = Duration::from_millis(self.engine.timings().player_ready_timeout_ms);
        let met = self.engine.wait_for_any_of(&conditions, timeout).await;

        if self.engine.any_visible(&self.catalog.unavailable).await {
            return Ok(Verification::Unavailable(
                "player reported an error".to_string(),
            ));
        }
        match met {
            Some(index) if index < ready_count => Ok(Verification::Ready(true)),
            _ => {
                debug!("player not confirmed, proceeding");
                Ok(Verification::Ready(false))
            }
        }
    }

    /// Bounded ad loop: exits when no indicator is visible, when a skip
    /// control was clicked, or when the attempt budget runs out.
    async fn clear_ads(&self, report: &mut PlaybackReport) -> Result<(), FlowError> {
        let timings = self.engine.timings();
        let attempts = timings.ad_attempts();
        let none: &[String] = &[];

        self.engine.pause_ms(timings.ad_grace_ms).await;
        for attempt in 1..=attempts {
            report.ad_probes = attempt;
            if !self.engine.any_visible(&self.catalog.ad_indicators).await {
                debug!(attempt, "no ad showing");
                return Ok(());
            }
            report.ad_seen = true;

            if let Some(skip) = self
                .engine
                .find_first_visible_clickable(&self.catalog.ad_skip_buttons, none)
                .await
            {
                self.engine.press(skip).await?;
                report.ad_skipped = true;
                info!(attempt, "ad skipped");
                return Ok(());
            }

            if attempt < attempts {
                self.engine.pause_ms(timings.ad_poll_interval_ms).await;
            }
        }

        info!(attempts, "ad not skippable, continuing");
        Ok(())
    }
}

enum Verification {
    Ready(bool),
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::InteractionTimings;
    use cdp_adapter::fake::{ClickBehavior, FakeNode, FakePage};
    use cdp_adapter::Cdp;
    use std::sync::Arc;

    const WATCH: &str = "https://www.youtube.com/watch?v=abc";

    async fn engine(page: FakePage, timings: InteractionTimings) -> (InteractionEngine, Arc<FakePage>) {
        let page = Arc::new(page.route("about:blank", vec![]));
        page.navigate("about:blank", Duration::from_secs(1)).await.unwrap();
        (InteractionEngine::new(page.clone(), timings), page)
    }

    fn item() -> ContentItem {
        ContentItem::from_id("abc")
    }

    #[tokio::test]
    async fn full_protocol_visits_every_state() {
        let page = FakePage::new().route(
            WATCH,
            vec![
                FakeNode::new("video"),
                FakeNode::new(".ytp-play-button").attr("title", "Play (k)").named("play"),
                FakeNode::new("[role=\"dialog\"] button").named("prompt"),
            ],
        );
        let (engine, page) = engine(page, InteractionTimings::immediate()).await;
        let catalog = SelectorCatalog::default();

        let report = PlaybackController::new(&engine, &catalog)
            .play(&item(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(
            report.visited,
            vec![
                PlaybackState::Selecting,
                PlaybackState::Verifying,
                PlaybackState::Starting,
                PlaybackState::ClearingAds,
                PlaybackState::ClearingPrompts,
                PlaybackState::Holding,
                PlaybackState::Done,
            ]
        );
        assert!(report.player_ready && report.play_clicked && report.prompt_dismissed);
        assert!(report.completed());
        assert_eq!(page.clicks(), vec!["play".to_string(), "prompt".to_string()]);
    }

    #[tokio::test]
    async fn bare_id_watch_accepts_consent_dialog() {
        let page = FakePage::new().route(
            WATCH,
            vec![
                FakeNode::new("video"),
                FakeNode::new("button")
                    .text("Accept all")
                    .named("consent")
                    .on_click(ClickBehavior::Hide("button".into())),
            ],
        );
        let (engine, page) = engine(page, InteractionTimings::immediate()).await;
        let catalog = SelectorCatalog::default();

        PlaybackController::new(&engine, &catalog)
            .play(&item(), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(page.clicks().first().map(String::as_str), Some("consent"));
    }

    #[tokio::test]
    async fn player_error_marks_item_unavailable() {
        let page = FakePage::new().route(
            WATCH,
            vec![FakeNode::new("ytd-player-error-message-renderer")],
        );
        let (engine, _page) = engine(page, InteractionTimings::immediate()).await;
        let catalog = SelectorCatalog::default();

        let err = PlaybackController::new(&engine, &catalog)
            .play(&item(), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn unopenable_item_is_unavailable() {
        let (engine, _page) = engine(FakePage::new().failing(WATCH), InteractionTimings::immediate()).await;
        let catalog = SelectorCatalog::default();
        let err = PlaybackController::new(&engine, &catalog)
            .play(&item(), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn skip_control_ends_the_ad_loop() {
        let page = FakePage::new().route(
            WATCH,
            vec![
                FakeNode::new("video"),
                FakeNode::new(".video-ads"),
                FakeNode::new(".ytp-ad-skip-button")
                    .named("skip")
                    .on_click(ClickBehavior::Hide(".video-ads".into())),
            ],
        );
        let (engine, page) = engine(page, InteractionTimings::immediate()).await;
        let catalog = SelectorCatalog::default();

        let report = PlaybackController::new(&engine, &catalog)
            .play(&item(), Duration::ZERO)
            .await
            .unwrap();
        assert!(report.ad_seen && report.ad_skipped);
        assert_eq!(report.ad_probes, 1);
        assert_eq!(page.clicks(), vec!["skip".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn unskippable_ad_loop_is_bounded() {
        let page = FakePage::new().route(
            WATCH,
            vec![FakeNode::new("video"), FakeNode::new(".video-ads")],
        );
        let timings = InteractionTimings {
            ad_grace_ms: 1_000,
            ad_poll_interval_ms: 2_000,
            ad_max_attempts: 10,
            ..InteractionTimings::immediate()
        };
        let (engine, _page) = engine(page, timings).await;
        let catalog = SelectorCatalog::default();

        let started = tokio::time::Instant::now();
        let report = PlaybackController::new(&engine, &catalog)
            .play(&item(), Duration::from_secs(5))
            .await
            .unwrap();

        assert!(report.ad_seen && !report.ad_skipped);
        assert_eq!(report.ad_probes, 10);
        assert!(report.completed());
        // grace + 9 pauses + hold
        assert_eq!(started.elapsed(), Duration::from_secs(1 + 18 + 5));
    }

    #[tokio::test]
    async fn failing_engine_call_ends_in_done() {
        let page = FakePage::new().route(
            WATCH,
            vec![
                FakeNode::new("video"),
                FakeNode::new(".ytp-play-button")
                    .attr("aria-label", "Play")
                    .on_click(ClickBehavior::Fail)
                    .on_script_click(ClickBehavior::Fail),
            ],
        );
        let (engine, _page) = engine(page, InteractionTimings::immediate()).await;
        let catalog = SelectorCatalog::default();

        let report = PlaybackController::new(&engine, &catalog)
            .play(&item(), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.visited.last(), Some(&PlaybackState::Done));
        assert!(!report.visited.contains(&PlaybackState::Holding));
        assert!(report.aborted.is_some());
        assert!(!report.completed());
    }

    #[tokio::test]
    async fn browser_crash_ends_playback_with_lost_session() {
        let page = FakePage::new().route(
            WATCH,
            vec![
                FakeNode::new("video"),
                FakeNode::new(".ytp-play-button")
                    .attr("aria-label", "Play")
                    .on_click(ClickBehavior::Crash),
            ],
        );
        let (engine, page) = engine(page, InteractionTimings::immediate()).await;
        let catalog = SelectorCatalog::default();

        let err = PlaybackController::new(&engine, &catalog)
            .play(&item(), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::SessionLost(_)), "{err:?}");
        assert!(!page.is_connected());
    }

    #[tokio::test]
    async fn dead_browser_is_not_reported_as_unavailable() {
        let page = FakePage::new().route(WATCH, vec![FakeNode::new("video")]);
        let (engine, page) = engine(page, InteractionTimings::immediate()).await;
        page.disconnect();
        let catalog = SelectorCatalog::default();

        let err = PlaybackController::new(&engine, &catalog)
            .play(&item(), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(!err.is_unavailable());
        assert!(matches!(err, FlowError::SessionLost(_)));
    }
}
