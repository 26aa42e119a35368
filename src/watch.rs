use crate::utils::is_image_file;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Reports image files appearing, changing or vanishing under a directory.
pub struct DirWatcher {
    dir: PathBuf,
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<()>,
}

impl DirWatcher {
    pub fn new(dir: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => warn!("Directory watch error: {}", e),
            },
            NotifyConfig::default(),
        )?;
        watcher.watch(dir, RecursiveMode::Recursive)?;
        debug!("Watching {} for changes", dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            _watcher: watcher,
            rx,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether anything changed since the last call. Clears the backlog.
    pub fn take_dirty(&mut self) -> bool {
        let mut dirty = false;
        while self.rx.try_recv().is_ok() {
            dirty = true;
        }
        dirty
    }

    /// Wait for the next change, then swallow whatever else queued up.
    pub async fn changed(&mut self) -> Option<()> {
        self.rx.recv().await?;
        self.take_dirty();
        Some(())
    }
}

fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| is_image_file(p))
}
