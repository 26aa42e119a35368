use super::{fallback_theme_now, parse_theme_output, ThemeProperties};
use crate::chromash::ThemeTool;
use crate::notification;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Where a derived theme came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeSource {
    Tool,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ThemeResponse {
    pub path: PathBuf,
    pub theme: ThemeProperties,
    pub source: ThemeSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    /// Debounce timer armed
    Scheduled,
    /// External tool running
    Analyzing,
}

/// Debounced theme derivation.
///
/// Only the most recent request survives the debounce window. Once the timer
/// fires, the analysis runs in its own task and is never cancelled; a later
/// request simply produces a newer result.
pub struct ThemePipeline {
    tool: Arc<dyn ThemeTool>,
    delay: Duration,
    notify: bool,
    timer: Option<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
    tx: mpsc::UnboundedSender<ThemeResponse>,
    rx: mpsc::UnboundedReceiver<ThemeResponse>,
}

impl ThemePipeline {
    pub fn new(tool: Arc<dyn ThemeTool>, delay: Duration, notify: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tool,
            delay,
            notify,
            timer: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            tx,
            rx,
        }
    }

    /// Arm the debounce timer for `path`, replacing any timer still pending.
    pub fn schedule(&mut self, path: PathBuf) {
        self.cancel();

        let tool = Arc::clone(&self.tool);
        let tx = self.tx.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let delay = self.delay;
        let notify = self.notify;

        debug!("Theme analysis scheduled for {}", path.display());
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so that cancelling the timer can't reach the analysis.
            in_flight.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let response = analyze(tool.as_ref(), &path).await;
                if notify {
                    notification::theme_applied(&response.path, &response.theme);
                }
                // Send before leaving Analyzing so Idle implies the result is queued
                let _ = tx.send(response);
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });
        }));
    }

    /// Drop a pending timer. Analyses already running are left alone.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    pub fn state(&self) -> PipelineState {
        let armed = self
            .timer
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false);
        if armed {
            PipelineState::Scheduled
        } else if self.in_flight.load(Ordering::SeqCst) > 0 {
            PipelineState::Analyzing
        } else {
            PipelineState::Idle
        }
    }

    /// A finished analysis, if one is waiting.
    pub fn try_recv(&mut self) -> Option<ThemeResponse> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next finished analysis.
    pub async fn recv(&mut self) -> Option<ThemeResponse> {
        self.rx.recv().await
    }
}

impl Drop for ThemePipeline {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Ask the tool for the current theme; any failure falls back to the heuristic.
pub async fn analyze(tool: &dyn ThemeTool, path: &Path) -> ThemeResponse {
    let from_tool = if tool.is_available() {
        match tool.theme().await {
            Ok(output) => {
                let parsed = parse_theme_output(&output);
                if parsed.is_none() {
                    warn!("Unrecognised chromash theme output, using fallback");
                }
                parsed
            }
            Err(e) => {
                warn!("chromash theme failed: {}", e);
                None
            }
        }
    } else {
        debug!("chromash unavailable, deriving theme from file name");
        None
    };

    match from_tool {
        Some(theme) => ThemeResponse {
            path: path.to_path_buf(),
            theme,
            source: ThemeSource::Tool,
        },
        None => ThemeResponse {
            path: path.to_path_buf(),
            theme: fallback_theme_now(path),
            source: ThemeSource::Fallback,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTool;
    use crate::theme::{ColorScheme, ThemeMode};

    fn pipeline(tool: &Arc<FakeTool>) -> ThemePipeline {
        ThemePipeline::new(tool.clone(), Duration::from_millis(100), false)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_requests_runs_tool_once_for_last_path() {
        let tool = Arc::new(FakeTool::with_theme("dark\nneutral"));
        let mut pipeline = pipeline(&tool);

        for name in ["a.png", "b.png", "c.png"] {
            pipeline.schedule(PathBuf::from(format!("/walls/{name}")));
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert_eq!(pipeline.state(), PipelineState::Scheduled);

        let response = pipeline.recv().await.unwrap();
        assert_eq!(response.path, PathBuf::from("/walls/c.png"));
        assert_eq!(response.source, ThemeSource::Tool);
        assert_eq!(
            response.theme,
            ThemeProperties::new(ThemeMode::Dark, ColorScheme::Neutral)
        );
        assert_eq!(tool.calls_named("theme"), 1);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(pipeline.try_recv().is_none());
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn requests_outside_window_each_run() {
        let tool = Arc::new(FakeTool::with_theme("light"));
        let mut pipeline = pipeline(&tool);

        pipeline.schedule(PathBuf::from("/walls/one.png"));
        let first = pipeline.recv().await.unwrap();
        pipeline.schedule(PathBuf::from("/walls/two.png"));
        let second = pipeline.recv().await.unwrap();

        assert_eq!(first.path, PathBuf::from("/walls/one.png"));
        assert_eq!(second.path, PathBuf::from("/walls/two.png"));
        assert_eq!(tool.calls_named("theme"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_tool_still_yields_fallback() {
        let tool = Arc::new(FakeTool::unavailable());
        let mut pipeline = pipeline(&tool);

        pipeline.schedule(PathBuf::from("/walls/night-grey.png"));
        let response = pipeline.recv().await.unwrap();

        assert_eq!(response.source, ThemeSource::Fallback);
        assert_eq!(response.theme.mode, ThemeMode::Dark);
        assert_eq!(response.theme.scheme, ColorScheme::Neutral);
        assert_eq!(tool.calls_named("theme"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_or_garbled_tool_output_falls_back() {
        let tool = Arc::new(FakeTool::with_theme("???"));
        let response = analyze(tool.as_ref(), Path::new("/w/bright.png")).await;
        assert_eq!(response.source, ThemeSource::Fallback);
        assert_eq!(response.theme.mode, ThemeMode::Light);

        let tool = FakeTool::with_theme("light");
        tool.fail_theme();
        let response = analyze(&tool, Path::new("/w/moon.png")).await;
        assert_eq!(response.source, ThemeSource::Fallback);
        assert_eq!(response.theme.mode, ThemeMode::Dark);
    }

    #[tokio::test(start_paused = true)]
    async fn running_analysis_survives_a_new_schedule() {
        let tool = Arc::new(FakeTool::with_theme("light"));
        tool.set_theme_delay(Duration::from_millis(1_000));
        let mut pipeline = pipeline(&tool);

        pipeline.schedule(PathBuf::from("/walls/first.png"));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(pipeline.state(), PipelineState::Analyzing);

        pipeline.schedule(PathBuf::from("/walls/second.png"));
        let first = pipeline.recv().await.unwrap();
        let second = pipeline.recv().await.unwrap();
        assert_eq!(first.path, PathBuf::from("/walls/first.png"));
        assert_eq!(second.path, PathBuf::from("/walls/second.png"));
        assert_eq!(tool.calls_named("theme"), 2);
    }
}
