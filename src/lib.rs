//! SnapDropper — screenshot capture core.
//!
//! Wires together the three execution contexts:
//! - Background host answering capture requests (capture/host.rs)
//! - Page context owning the selection overlay (page.rs, overlay/)
//! - Control surface calls through the coordinator (capture/coordinator.rs)
//!
//! plus the shared persistent store (store/) for screenshots and settings.

pub mod capture;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod notice;
pub mod overlay;
pub mod page;
pub mod protocol;
pub mod store;

use std::sync::Arc;

use capture::{BackgroundHost, Browser, CaptureCoordinator};
use clipboard::ClipboardSink;
use config::AppConfig;
use export::Exporter;
use store::{FileStorage, ScreenshotStore, SettingsStore, StorageArea};

pub use error::SnapError;

/// Installs the `env_logger` backend. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Process-wide singletons shared by every context.
pub struct Extension {
    pub host: Arc<BackgroundHost>,
    pub settings: Arc<SettingsStore>,
    pub screenshots: Arc<ScreenshotStore>,
    pub coordinator: Arc<CaptureCoordinator>,
}

impl Extension {
    /// Builds the extension on a file-backed storage area under `config.data_dir`.
    pub fn new(
        config: &AppConfig,
        browser: Arc<dyn Browser>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        let storage = Arc::new(FileStorage::new(
            config.data_dir.clone(),
            config.storage_quota_bytes,
        ));
        Self::with_storage(config, storage, browser, clipboard)
    }

    pub fn with_storage(
        config: &AppConfig,
        storage: Arc<dyn StorageArea>,
        browser: Arc<dyn Browser>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        let host = Arc::new(BackgroundHost::new(browser.clone()));
        let settings = Arc::new(SettingsStore::new(storage.clone()));
        let screenshots = Arc::new(ScreenshotStore::new(storage, settings.clone()));
        let coordinator = Arc::new(
            CaptureCoordinator::new(
                browser,
                host.clone(),
                settings.clone(),
                Arc::new(Exporter::new(config.download_dir.clone())),
                clipboard,
            )
            .with_timeouts(config.capture_timeout, config.request_timeout),
        );

        log::info!(
            "SnapDropper ready — storage capacity ~{} screenshots",
            screenshots.calculate_max_capacity()
        );

        Self {
            host,
            settings,
            screenshots,
            coordinator,
        }
    }
}
