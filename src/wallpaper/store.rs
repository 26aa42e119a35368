use super::{scan_directory, StoreError, StoreEvent, WallpaperItem};
use crate::cache::{BoundedCache, EvictionOrder};
use crate::chromash::{self, ThemeTool, ToolError};
use crate::config::{Config, OptionSubscription, Options};
use crate::events::{EventBus, Subscription};
use crate::fuzzy::FuzzyIndex;
use crate::theme::{
    CachedThemeEntry, PipelineState, ThemeCacheMap, ThemeMode, ThemePipeline, ThemeProperties,
    ThemeResponse,
};
use crate::thumbnail::{self, CachedThumbnail};
use crate::utils::now_millis;
use crate::watch::DirWatcher;
use image::RgbaImage;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Static knobs taken from the config file.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub include_hidden: bool,
    pub scan_depth: usize,
    pub max_items: usize,
    pub debounce: Duration,
    pub apply_settle: Duration,
    pub notify: bool,
    pub watch_directory: bool,
}

impl StoreSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            include_hidden: config.wallpaper.include_hidden,
            scan_depth: config.wallpaper.scan_depth,
            max_items: config.wallpaper.max_items,
            debounce: Duration::from_millis(config.theme.debounce_ms),
            apply_settle: Duration::from_millis(config.theme.apply_settle_ms),
            notify: config.theme.notify,
            watch_directory: config.wallpaper.watch_directory,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

enum Activity {
    Theme(ThemeResponse),
    Rescan,
    Closed,
}

/// Indexed wallpapers, their thumbnails and derived themes.
///
/// Single owner: every method takes `&mut self` and the store is driven from
/// one task. Theme analysis results arrive through the pipeline channel and
/// are folded in by [`WallpaperStore::sync`] or [`WallpaperStore::process_next`].
pub struct WallpaperStore {
    options: Options,
    settings: StoreSettings,
    tool: Arc<dyn ThemeTool>,
    index: FuzzyIndex<WallpaperItem>,
    loaded: bool,
    thumbnails: BoundedCache<PathBuf, CachedThumbnail>,
    themes: BoundedCache<String, CachedThemeEntry>,
    pipeline: ThemePipeline,
    dir_changes: Option<OptionSubscription<PathBuf>>,
    thumbnail_capacity: OptionSubscription<usize>,
    theme_capacity: OptionSubscription<usize>,
    watcher: Option<DirWatcher>,
    events: EventBus<StoreEvent>,
    disposed: bool,
}

impl WallpaperStore {
    pub fn new(options: Options, tool: Arc<dyn ThemeTool>, settings: StoreSettings) -> Self {
        let mut thumbnail_capacity = options.thumbnail_cache_size.subscribe();
        let mut theme_capacity = options.theme_cache_size.subscribe();
        let mut dir_changes = options.wallpaper_dir.subscribe();
        dir_changes.latest();

        let thumbnails = BoundedCache::new(thumbnail_capacity.latest(), EvictionOrder::LastAccessed);
        let mut themes = BoundedCache::new(theme_capacity.latest(), EvictionOrder::Inserted);

        let persisted = options.theme_cache.get();
        let total = persisted.len();
        let mut entries: Vec<(String, CachedThemeEntry)> = persisted
            .into_iter()
            .filter(|(_, entry)| entry.timestamp > 0)
            .collect();
        if entries.len() < total {
            debug!(
                "Discarded {} persisted theme entries without a timestamp",
                total - entries.len()
            );
        }
        entries.sort_by_key(|(_, entry)| entry.timestamp);
        for (key, entry) in entries {
            themes.put(key, entry);
        }

        let pipeline = ThemePipeline::new(Arc::clone(&tool), settings.debounce, settings.notify);

        Self {
            options,
            settings,
            tool,
            index: FuzzyIndex::default(),
            loaded: false,
            thumbnails,
            themes,
            pipeline,
            dir_changes: Some(dir_changes),
            thumbnail_capacity,
            theme_capacity,
            watcher: None,
            events: EventBus::new(),
            disposed: false,
        }
    }

    pub fn subscribe(&self) -> Subscription<StoreEvent> {
        self.events.subscribe()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn max_items(&self) -> usize {
        self.settings.max_items
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn current_wallpaper(&self) -> Option<PathBuf> {
        self.options.current_wallpaper.get()
    }

    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline.state()
    }

    pub fn thumbnail_cache_len(&self) -> usize {
        self.thumbnails.len()
    }

    pub fn theme_cache_len(&self) -> usize {
        self.themes.len()
    }

    /// Blank text lists everything by name; otherwise fuzzy-ranked by file name.
    pub async fn search(&mut self, text: &str) -> Vec<WallpaperItem> {
        if self.disposed {
            return Vec::new();
        }
        self.sync().await;
        if !self.loaded {
            self.refresh().await;
        }

        let text = text.trim();
        let max = self.settings.max_items;
        if text.is_empty() {
            self.index.items().take(max).cloned().collect()
        } else {
            self.index.search(text, max).into_iter().cloned().collect()
        }
    }

    /// Rescan the configured directory and swap in the new index.
    pub async fn refresh(&mut self) -> usize {
        if self.disposed {
            return 0;
        }

        let dir = self.options.wallpaper_dir.get();
        let scan_dir = dir.clone();
        let depth = self.settings.scan_depth;
        let include_hidden = self.settings.include_hidden;

        let scanned =
            tokio::task::spawn_blocking(move || scan_directory(&scan_dir, depth, include_hidden))
                .await;
        let items = match scanned {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                warn!("{}", e);
                Vec::new()
            }
            Err(e) => {
                warn!("Wallpaper scan task failed: {}", e);
                Vec::new()
            }
        };

        let count = items.len();
        self.index = FuzzyIndex::new(items, |item| item.name.clone());
        self.loaded = true;
        self.ensure_watcher(&dir);

        info!("Indexed {} wallpapers in {}", count, dir.display());
        self.events.emit(StoreEvent::WallpapersChanged { count });
        count
    }

    fn ensure_watcher(&mut self, dir: &Path) {
        if !self.settings.watch_directory {
            return;
        }
        if self.watcher.as_ref().is_some_and(|w| w.dir() == dir) {
            return;
        }
        self.watcher = match DirWatcher::new(dir) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Could not watch {}: {}", dir.display(), e);
                None
            }
        };
    }

    /// Fold in finished theme analyses and capacity changes.
    fn drain_ready(&mut self) {
        while let Some(response) = self.pipeline.try_recv() {
            self.handle_theme_ready(response);
        }
        if self.thumbnail_capacity.has_changed() {
            self.thumbnails
                .set_capacity(self.thumbnail_capacity.latest());
        }
        if self.theme_capacity.has_changed() {
            self.themes.set_capacity(self.theme_capacity.latest());
        }
    }

    /// Apply everything that is ready without waiting, rescanning if the
    /// directory option or its contents changed.
    pub async fn sync(&mut self) {
        if self.disposed {
            return;
        }
        self.drain_ready();

        let mut rescan = false;
        if let Some(dir_changes) = self.dir_changes.as_mut() {
            if dir_changes.has_changed() {
                dir_changes.latest();
                rescan = true;
            }
        }
        if let Some(watcher) = self.watcher.as_mut() {
            rescan |= watcher.take_dirty();
        }

        if rescan && self.loaded {
            self.refresh().await;
        }
    }

    /// Wait for the next theme result or directory change and handle it.
    /// Returns `false` once there is nothing left to wait on.
    pub async fn process_next(&mut self) -> bool {
        if self.disposed {
            return false;
        }

        let activity = tokio::select! {
            response = self.pipeline.recv() => match response {
                Some(response) => Activity::Theme(response),
                None => Activity::Closed,
            },
            changed = option_changed(&mut self.dir_changes) => match changed {
                Some(_) => Activity::Rescan,
                None => Activity::Closed,
            },
            _ = watcher_changed(&mut self.watcher) => Activity::Rescan,
        };

        match activity {
            Activity::Theme(response) => self.handle_theme_ready(response),
            Activity::Rescan => {
                self.refresh().await;
            }
            Activity::Closed => return false,
        }
        self.drain_ready();
        true
    }

    /// Wait until no theme analysis is pending, then apply whatever is ready.
    pub async fn settle(&mut self) {
        while self.pipeline_state() != PipelineState::Idle {
            if !self.process_next().await {
                break;
            }
        }
        self.sync().await;
    }

    pub async fn set_wallpaper(&mut self, item: &WallpaperItem) -> Result<(), StoreError> {
        self.set_wallpaper_path(&item.path).await
    }

    /// Record `path` as current, apply it, and schedule theme analysis.
    /// The recorded path is rolled back if applying fails.
    pub async fn set_wallpaper_path(&mut self, path: &Path) -> Result<(), StoreError> {
        let previous = self.options.current_wallpaper.get();
        if previous.as_deref() == Some(path) {
            debug!("{} is already the wallpaper", path.display());
            return Ok(());
        }

        self.options.current_wallpaper.set(Some(path.to_path_buf()));

        match chromash::apply_wallpaper(self.tool.as_ref(), path, self.settings.apply_settle).await
        {
            Ok(()) => {
                info!("Wallpaper set to {}", path.display());
                self.pipeline.schedule(path.to_path_buf());
                self.events.emit(StoreEvent::WallpaperSet(path.to_path_buf()));
                Ok(())
            }
            Err(e) => {
                self.options.current_wallpaper.set(previous);
                let err = StoreError::Apply(e);
                error!("{}", err);
                self.events.emit(StoreEvent::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Pick any indexed wallpaper other than the current one and apply it.
    pub async fn set_random_wallpaper(&mut self) -> Result<WallpaperItem, StoreError> {
        self.sync().await;
        if !self.loaded {
            self.refresh().await;
        }

        let current = self.options.current_wallpaper.get();
        let choice = {
            let all: Vec<&WallpaperItem> = self.index.items().collect();
            let others: Vec<&WallpaperItem> = all
                .iter()
                .copied()
                .filter(|item| current.as_ref() != Some(&item.path))
                .collect();
            let pool = if others.is_empty() { &all } else { &others };
            pool.choose(&mut rand::thread_rng()).map(|item| (*item).clone())
        };

        let Some(item) = choice else {
            let err = StoreError::NoWallpapers;
            warn!("{}", err);
            self.events.emit(StoreEvent::Error(err.to_string()));
            return Err(err);
        };

        self.set_wallpaper(&item).await?;
        Ok(item)
    }

    /// Cached or freshly decoded thumbnail; `None` if the image can't be read.
    pub async fn get_thumbnail(&mut self, path: &Path) -> Option<Arc<RgbaImage>> {
        match self.try_thumbnail(path).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    pub async fn try_thumbnail(&mut self, path: &Path) -> Result<Arc<RgbaImage>, StoreError> {
        self.drain_ready();
        let key = path.to_path_buf();

        if let Some(entry) = self.thumbnails.get_mut(&key) {
            entry.last_accessed = now_millis();
            return Ok(Arc::clone(&entry.image));
        }

        let image = thumbnail::load_thumbnail(path)
            .await
            .map_err(|e| StoreError::Decode {
                path: key.clone(),
                reason: format!("{e:#}"),
            })?;

        let entry = CachedThumbnail::new(image, now_millis());
        let image = Arc::clone(&entry.image);
        let evicted = self.thumbnails.put(key, entry);
        if !evicted.is_empty() {
            debug!("Evicted {} thumbnails", evicted.len());
        }
        Ok(image)
    }

    pub fn cached_theme(&mut self, path: &Path) -> Option<ThemeProperties> {
        self.drain_ready();
        let key = path.to_string_lossy();
        self.themes.get(&key.into_owned()).map(|entry| entry.theme)
    }

    /// Schedule analysis for `path` and wait until its result is cached.
    pub async fn analyze_theme(&mut self, path: &Path) -> Option<ThemeProperties> {
        self.pipeline.schedule(path.to_path_buf());
        while let Some(response) = self.pipeline.recv().await {
            let done = response.path == path;
            let theme = response.theme;
            self.handle_theme_ready(response);
            if done {
                return Some(theme);
            }
        }
        None
    }

    /// Cache a finished analysis and persist the theme cache.
    pub fn handle_theme_ready(&mut self, response: ThemeResponse) {
        if self.disposed {
            return;
        }

        let key = response.path.to_string_lossy().into_owned();
        let entry = CachedThemeEntry {
            theme: response.theme,
            timestamp: now_millis(),
        };
        let evicted = self.themes.put(key, entry);
        if !evicted.is_empty() {
            debug!("Evicted {} theme entries", evicted.len());
        }
        self.persist_themes();

        info!(
            "Theme for {}: {} ({:?})",
            response.path.display(),
            response.theme,
            response.source
        );
        self.events.emit(StoreEvent::ThemeCached {
            path: response.path,
            theme: response.theme,
        });
    }

    fn persist_themes(&self) {
        let map: ThemeCacheMap = self
            .themes
            .iter_oldest_first()
            .map(|(key, entry)| (key.clone(), *entry))
            .collect();
        self.options.theme_cache.set(map);
    }

    /// `color <value>` followed by `export-colors`.
    pub async fn apply_color_theme(
        &self,
        color: &str,
        mode: Option<ThemeMode>,
        scheme: Option<&str>,
    ) -> Result<(), StoreError> {
        let result = match self.tool.color(color, mode, scheme).await {
            Ok(()) => self.tool.export_colors().await,
            Err(e) => Err(e),
        };
        self.report_tool_result(result)
    }

    /// `preset apply <name>` followed by `export-colors`.
    pub async fn apply_preset(&self, name: &str) -> Result<(), StoreError> {
        let result = match self.tool.preset_apply(name).await {
            Ok(()) => self.tool.export_colors().await,
            Err(e) => Err(e),
        };
        self.report_tool_result(result)
    }

    fn report_tool_result(&self, result: Result<(), ToolError>) -> Result<(), StoreError> {
        result.map_err(|e| {
            let err = StoreError::Apply(e);
            error!("{}", err);
            self.events.emit(StoreEvent::Error(err.to_string()));
            err
        })
    }

    /// Preset names known to the tool; empty if it can't be asked.
    pub async fn list_presets(&self) -> Vec<String> {
        match self.tool.presets().await {
            Ok(presets) => presets,
            Err(e) => {
                warn!("Could not list presets: {}", e);
                Vec::new()
            }
        }
    }

    pub fn clear_thumbnail_cache(&mut self) {
        self.thumbnails.clear();
    }

    /// Drop every cached theme, persisted ones included.
    pub fn clear_theme_cache(&mut self) {
        self.themes.clear();
        self.options.theme_cache.set(ThemeCacheMap::new());
    }

    /// Release caches, cancel pending analysis and stop watching. Persisted
    /// state is left alone. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.pipeline.cancel();
        self.thumbnails.clear();
        self.themes.clear();
        self.index = FuzzyIndex::default();
        self.loaded = false;
        self.dir_changes = None;
        self.watcher = None;
        debug!("Wallpaper store disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

async fn option_changed<T: Clone>(sub: &mut Option<OptionSubscription<T>>) -> Option<T> {
    match sub {
        Some(sub) => sub.changed().await,
        None => std::future::pending().await,
    }
}

async fn watcher_changed(watcher: &mut Option<DirWatcher>) {
    if let Some(watcher) = watcher {
        if watcher.changed().await.is_some() {
            return;
        }
    }
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTool;
    use crate::theme::ColorScheme;

    fn png(path: &Path, width: u32, height: u32) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        image::RgbImage::from_pixel(width, height, image::Rgb([90, 120, 200]))
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
    }

    fn wallpapers(dir: &Path, names: &[&str]) {
        for name in names {
            png(&dir.join(name), 8, 6);
        }
    }

    fn settings() -> StoreSettings {
        StoreSettings {
            apply_settle: Duration::ZERO,
            notify: false,
            watch_directory: false,
            ..StoreSettings::default()
        }
    }

    fn store(dir: &Path, tool: &Arc<FakeTool>) -> WallpaperStore {
        WallpaperStore::new(
            Options::in_memory(dir.to_path_buf()),
            tool.clone(),
            settings(),
        )
    }

    fn names(items: &[WallpaperItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn blank_search_lists_by_name_up_to_max_items() {
        let dir = tempfile::tempdir().unwrap();
        wallpapers(dir.path(), &["delta.png", "alpha.png", "charlie.png", "bravo.png"]);
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = WallpaperStore::new(
            Options::in_memory(dir.path().to_path_buf()),
            tool,
            StoreSettings {
                max_items: 3,
                ..settings()
            },
        );

        let items = store.search("   ").await;
        assert_eq!(names(&items), vec!["alpha.png", "bravo.png", "charlie.png"]);
        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn search_ranks_matches_and_tolerates_no_match() {
        let dir = tempfile::tempdir().unwrap();
        wallpapers(dir.path(), &["mountain.png", "ocean.png", "forest/moss.png"]);
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(dir.path(), &tool);

        let items = store.search("mount").await;
        assert_eq!(names(&items), vec!["mountain.png"]);
        assert!(store.search("zz-no-match").await.is_empty());
    }

    #[tokio::test]
    async fn capitalised_query_finds_lowercase_names() {
        let dir = tempfile::tempdir().unwrap();
        wallpapers(dir.path(), &["forest.png", "ocean.png"]);
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(dir.path(), &tool);

        let upper = store.search("Forest").await;
        let lower = store.search("forest").await;
        assert_eq!(names(&upper), vec!["forest.png"]);
        assert_eq!(names(&upper), names(&lower));
    }

    #[tokio::test]
    async fn missing_directory_degrades_to_empty() {
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(Path::new("/nonexistent/frostpick"), &tool);
        let mut events = store.subscribe();

        assert!(store.search("").await.is_empty());
        assert_eq!(
            events.try_next(),
            Some(StoreEvent::WallpapersChanged { count: 0 })
        );
    }

    #[tokio::test]
    async fn setting_current_wallpaper_again_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        wallpapers(dir.path(), &["a.png"]);
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(dir.path(), &tool);
        let item = store.search("").await.remove(0);

        store
            .options()
            .current_wallpaper
            .set(Some(item.path.clone()));
        let writes = store.options().current_wallpaper.subscribe();

        store.set_wallpaper(&item).await.unwrap();
        assert!(tool.calls().is_empty());
        assert!(!writes.has_changed());
        assert_eq!(store.pipeline_state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn failed_apply_rolls_back_and_reports_once() {
        let dir = tempfile::tempdir().unwrap();
        wallpapers(dir.path(), &["a.png"]);
        let tool = Arc::new(FakeTool::with_theme("dark"));
        tool.fail_wallpaper();
        let mut store = store(dir.path(), &tool);
        let item = store.search("").await.remove(0);

        let previous = Some(PathBuf::from("/old/wall.png"));
        store.options().current_wallpaper.set(previous.clone());
        let mut events = store.subscribe();

        let err = store.set_wallpaper(&item).await.unwrap_err();
        assert!(matches!(err, StoreError::Apply(_)));
        assert_eq!(store.current_wallpaper(), previous);

        let errors: Vec<_> = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, StoreEvent::Error(_)))
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(tool.calls_named("export-colors"), 0);
        assert_eq!(store.pipeline_state(), PipelineState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_apply_caches_theme_after_debounce() {
        let dir = tempfile::tempdir().unwrap();
        wallpapers(dir.path(), &["a.png"]);
        let tool = Arc::new(FakeTool::with_theme("Mode: light\nScheme: neutral"));
        let mut store = store(dir.path(), &tool);
        let item = store.search("").await.remove(0);
        let mut events = store.subscribe();

        store.set_wallpaper(&item).await.unwrap();
        assert_eq!(
            tool.calls(),
            vec![format!("wallpaper {}", item.path.display()), "export-colors".to_string()]
        );
        assert_eq!(store.pipeline_state(), PipelineState::Scheduled);
        assert_eq!(events.try_next(), Some(StoreEvent::WallpaperSet(item.path.clone())));

        assert!(store.process_next().await);
        let expected = ThemeProperties::new(ThemeMode::Light, ColorScheme::Neutral);
        assert_eq!(store.cached_theme(&item.path), Some(expected));
        assert_eq!(
            events.try_next(),
            Some(StoreEvent::ThemeCached {
                path: item.path.clone(),
                theme: expected
            })
        );

        let persisted = store.options().theme_cache.get();
        assert_eq!(persisted[&item.id].theme, expected);
        assert!(persisted[&item.id].timestamp > 0);
    }

    #[tokio::test]
    async fn random_never_repeats_current_when_alternatives_exist() {
        let dir = tempfile::tempdir().unwrap();
        wallpapers(dir.path(), &["a.png", "b.png", "c.png"]);
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(dir.path(), &tool);

        for _ in 0..10 {
            let before = store.current_wallpaper();
            let item = store.set_random_wallpaper().await.unwrap();
            assert_ne!(Some(item.path.clone()), before);
            assert_eq!(store.current_wallpaper(), Some(item.path));
        }
    }

    #[tokio::test]
    async fn random_with_only_current_reselects_it() {
        let dir = tempfile::tempdir().unwrap();
        wallpapers(dir.path(), &["only.png"]);
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(dir.path(), &tool);
        let only = store.search("").await.remove(0);
        store.options().current_wallpaper.set(Some(only.path.clone()));

        let picked = store.set_random_wallpaper().await.unwrap();
        assert_eq!(picked, only);
        assert!(tool.calls().is_empty());
    }

    #[tokio::test]
    async fn random_on_empty_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(dir.path(), &tool);
        let mut events = store.subscribe();

        let err = store.set_random_wallpaper().await.unwrap_err();
        assert!(matches!(err, StoreError::NoWallpapers));
        let errors = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, StoreEvent::Error(_)))
            .count();
        assert_eq!(errors, 1);
        assert!(tool.calls().is_empty());
    }

    #[tokio::test]
    async fn thumbnails_are_cached_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        png(&dir.path().join("big.png"), 560, 400);
        png(&dir.path().join("other.png"), 100, 100);
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(dir.path(), &tool);

        let first = store.get_thumbnail(&dir.path().join("big.png")).await.unwrap();
        assert_eq!(first.dimensions(), (280, 200));
        let again = store.get_thumbnail(&dir.path().join("big.png")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        store.options().thumbnail_cache_size.set(1);
        store.get_thumbnail(&dir.path().join("other.png")).await.unwrap();
        assert_eq!(store.thumbnail_cache_len(), 1);
    }

    #[tokio::test]
    async fn undecodable_thumbnail_is_absent_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"nope").unwrap();
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(dir.path(), &tool);

        assert!(store.get_thumbnail(&bad).await.is_none());
        assert_eq!(store.thumbnail_cache_len(), 0);
    }

    #[tokio::test]
    async fn persisted_entries_without_timestamp_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options::in_memory(dir.path().to_path_buf());
        let theme = ThemeProperties::new(ThemeMode::Dark, ColorScheme::Vibrant);
        options.theme_cache.update(|map| {
            map.insert("/w/old.png".into(), CachedThemeEntry { theme, timestamp: 0 });
            map.insert("/w/new.png".into(), CachedThemeEntry { theme, timestamp: 5 });
        });
        let tool: Arc<FakeTool> = Arc::new(FakeTool::with_theme("dark"));

        let mut store = WallpaperStore::new(options, tool, settings());
        assert_eq!(store.theme_cache_len(), 1);
        assert_eq!(store.cached_theme(Path::new("/w/new.png")), Some(theme));
        assert_eq!(store.cached_theme(Path::new("/w/old.png")), None);
    }

    #[tokio::test]
    async fn directory_option_change_triggers_rescan() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        wallpapers(first.path(), &["one.png"]);
        wallpapers(second.path(), &["two.png", "three.png"]);
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(first.path(), &tool);

        assert_eq!(store.search("").await.len(), 1);
        store
            .options()
            .wallpaper_dir
            .set(second.path().to_path_buf());
        assert_eq!(names(&store.search("").await), vec!["three.png", "two.png"]);
    }

    #[tokio::test]
    async fn color_and_preset_export_afterwards() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let store = store(dir.path(), &tool);

        store
            .apply_color_theme("#5e81ac", Some(ThemeMode::Dark), None)
            .await
            .unwrap();
        store.apply_preset("nord").await.unwrap();
        assert_eq!(
            tool.calls(),
            vec![
                "color #5e81ac --mode dark",
                "export-colors",
                "preset apply nord",
                "export-colors"
            ]
        );
        assert_eq!(store.list_presets().await, vec!["nord", "gruvbox"]);
    }

    #[tokio::test]
    async fn unavailable_tool_yields_no_presets() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::unavailable());
        let store = store(dir.path(), &tool);
        assert!(store.list_presets().await.is_empty());
    }

    #[tokio::test]
    async fn clearing_theme_cache_resets_persisted_map() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(dir.path(), &tool);
        store.handle_theme_ready(ThemeResponse {
            path: PathBuf::from("/w/a.png"),
            theme: ThemeProperties::new(ThemeMode::Dark, ColorScheme::Vibrant),
            source: crate::theme::ThemeSource::Tool,
        });
        assert_eq!(store.options().theme_cache.get().len(), 1);

        store.clear_theme_cache();
        assert_eq!(store.theme_cache_len(), 0);
        assert!(store.options().theme_cache.get().is_empty());
    }

    #[tokio::test]
    async fn dispose_is_idempotent_and_keeps_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        wallpapers(dir.path(), &["a.png"]);
        let tool = Arc::new(FakeTool::with_theme("dark"));
        let mut store = store(dir.path(), &tool);
        store.search("").await;
        store.handle_theme_ready(ThemeResponse {
            path: PathBuf::from("/w/a.png"),
            theme: ThemeProperties::new(ThemeMode::Light, ColorScheme::Vibrant),
            source: crate::theme::ThemeSource::Fallback,
        });

        store.dispose();
        store.dispose();
        assert!(store.is_disposed());
        assert_eq!(store.theme_cache_len(), 0);
        assert!(store.search("").await.is_empty());
        assert_eq!(store.options().theme_cache.get().len(), 1);
    }
}
