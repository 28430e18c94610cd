//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{DevServerConfig, WatchConfig};

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    settings: WatchConfig,
    update_tx: mpsc::UnboundedSender<DevServerConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(
        path: &Path,
        settings: WatchConfig,
    ) -> (Self, mpsc::UnboundedReceiver<DevServerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                settings,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned handle must be kept alive; dropping it stops the watch.
    pub fn run(self) -> Result<Box<dyn Watcher + Send>, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event.kind.is_modify() || event.kind.is_create() {
                    tracing::info!("Config file change detected, reloading...");
                    match load_config(&path) {
                        Ok(new_config) => {
                            let _ = tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!(
                                "Failed to reload config: {}. Keeping current configuration.",
                                e
                            );
                        }
                    }
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        };

        let interval = Duration::from_millis(self.settings.poll_interval_ms);
        let mut watcher: Box<dyn Watcher + Send> = if self.settings.use_polling {
            Box::new(PollWatcher::new(
                handler,
                Config::default()
                    .with_poll_interval(interval)
                    .with_compare_contents(true),
            )?)
        } else {
            Box::new(RecommendedWatcher::new(handler, Config::default())?)
        };

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(
            path = ?self.path,
            polling = self.settings.use_polling,
            "Config watcher started"
        );
        Ok(watcher)
    }
}
