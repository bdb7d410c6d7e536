//! Settings management for the fence language server.
//!
//! This module handles:
//! - Loading settings layers from TOML files
//! - Loading priority: built-in < user-global < workspace < explicit
//! - File watching for live reload
//! - Error handling: a broken layer is reported and skipped

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config as WatcherConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{RwLock, mpsc, watch};
use tower_lsp::Client;
use tower_lsp::lsp_types::MessageType;

use crate::config::Config;
use crate::settings::schema::{LintSettings, SettingsFile};

const BUILT_IN_SETTINGS: &str = include_str!("../../resources/settings/default.fence-ls.toml");

/// Represents the loading priority of a settings layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SettingsPriority {
    BuiltIn = 0,
    UserGlobal = 1,
    Workspace = 2,
    Explicit = 3,
}

/// A loaded settings file with its source and priority
#[derive(Debug, Clone)]
pub struct SettingsLayer {
    pub file: SettingsFile,
    pub priority: SettingsPriority,
    pub source_path: Option<PathBuf>,
}

/// Events from the file watcher
#[derive(Debug)]
enum WatcherEvent {
    SettingsFileChanged(PathBuf),
    WatcherError(notify::Error),
}

/// Loads, resolves and watches the lint settings
pub struct SettingsManager {
    /// Resolved settings shared with readers
    settings: Arc<RwLock<LintSettings>>,
    /// Layers that contributed to the resolved settings
    layers: Arc<RwLock<Vec<SettingsLayer>>>,
    /// Bumped after every (re)load
    generation: Arc<watch::Sender<u64>>,
    /// On-disk layer locations, lowest priority first
    sources: Vec<(SettingsPriority, PathBuf)>,
    /// File watcher
    _watcher: Option<RecommendedWatcher>,
    /// Channel to receive watcher events
    watcher_rx: Option<mpsc::UnboundedReceiver<WatcherEvent>>,
    /// LSP client for logging
    client: Option<Client>,
}

impl SettingsManager {
    /// Create a settings manager for the locations named by the configuration
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_sources(config.settings_sources()))
    }

    /// Create a settings manager for explicit layer locations
    pub fn with_sources(mut sources: Vec<(SettingsPriority, PathBuf)>) -> Self {
        sources.sort_by_key(|(priority, _)| *priority);

        Self {
            settings: Arc::new(RwLock::new(LintSettings::default())),
            layers: Arc::new(RwLock::new(Vec::new())),
            generation: Arc::new(watch::Sender::new(0)),
            sources,
            _watcher: None,
            watcher_rx: None,
            client: None,
        }
    }

    /// Load all layers and start watching them for changes
    pub async fn initialize(&mut self, client: Option<Client>) -> Result<()> {
        self.load().await?;
        self.watch(client)
    }

    /// Start watching the layer files; reloads are reported to `client`
    pub fn watch(&mut self, client: Option<Client>) -> Result<()> {
        self.client = client;
        self.start_watching()
    }

    /// Receiver notified after every (re)load of the settings
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Load (or reload) every layer and resolve the settings
    pub async fn load(&self) -> Result<()> {
        Self::reload(
            self.settings.clone(),
            self.layers.clone(),
            &self.generation,
            &self.sources,
            self.client.as_ref(),
        )
        .await;
        Ok(())
    }

    /// Currently effective settings
    pub async fn current(&self) -> LintSettings {
        self.settings.read().await.clone()
    }

    /// Shared handle to the effective settings, updated on reload
    pub fn shared(&self) -> Arc<RwLock<LintSettings>> {
        self.settings.clone()
    }

    /// Layers loaded by the last (re)load, lowest priority first
    pub async fn layers(&self) -> Vec<SettingsLayer> {
        self.layers.read().await.clone()
    }

    /// Resolve layers into effective settings, higher priority last
    pub fn resolve(layers: &[SettingsLayer]) -> LintSettings {
        let mut ordered: Vec<&SettingsLayer> = layers.iter().collect();
        ordered.sort_by_key(|layer| layer.priority);

        let mut settings = LintSettings::default();
        for layer in ordered {
            settings.apply(&layer.file);
        }
        settings
    }

    /// Parse settings content from TOML string
    pub fn parse_settings_content(content: &str, source_path: Option<&Path>) -> Result<SettingsFile> {
        toml::from_str(content).with_context(|| match source_path {
            Some(path) => format!("Failed to parse settings TOML: {}", path.display()),
            None => "Failed to parse built-in settings TOML".to_string(),
        })
    }

    /// Static reload shared by `load` and the watcher task
    async fn reload(
        settings: Arc<RwLock<LintSettings>>,
        layers: Arc<RwLock<Vec<SettingsLayer>>>,
        generation: &watch::Sender<u64>,
        sources: &[(SettingsPriority, PathBuf)],
        client: Option<&Client>,
    ) {
        let mut new_layers = Vec::new();

        match Self::parse_settings_content(BUILT_IN_SETTINGS, None) {
            Ok(file) => new_layers.push(SettingsLayer {
                file,
                priority: SettingsPriority::BuiltIn,
                source_path: None,
            }),
            Err(e) => {
                // Falls back to the hard-coded defaults
                report(client, MessageType::ERROR, format!("{:#}", e)).await;
            }
        }

        for (priority, path) in sources {
            if !path.exists() {
                continue;
            }
            match Self::load_settings_file(path).await {
                Ok(file) => new_layers.push(SettingsLayer {
                    file,
                    priority: *priority,
                    source_path: Some(path.clone()),
                }),
                Err(e) => {
                    report(
                        client,
                        MessageType::WARNING,
                        format!("Skipping settings layer: {:#}", e),
                    )
                    .await;
                }
            }
        }

        let resolved = Self::resolve(&new_layers);
        let count = new_layers.len();
        {
            *settings.write().await = resolved;
            *layers.write().await = new_layers;
        }
        generation.send_modify(|n| *n += 1);

        report(
            client,
            MessageType::INFO,
            format!("Loaded {} settings layers", count),
        )
        .await;
    }

    /// Load a single settings file
    async fn load_settings_file(path: &Path) -> Result<SettingsFile> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        Self::parse_settings_content(&content, Some(path))
    }

    /// Start file watching for the directories holding settings files
    fn start_watching(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.watcher_rx = Some(rx);

        let file_names: HashSet<_> = self
            .sources
            .iter()
            .filter_map(|(_, path)| path.file_name().map(|n| n.to_os_string()))
            .collect();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if let EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) =
                        event.kind
                    {
                        for path in event.paths {
                            if path.file_name().is_some_and(|n| file_names.contains(n)) {
                                let _ = tx.send(WatcherEvent::SettingsFileChanged(path));
                            }
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatcherEvent::WatcherError(e));
                }
            },
            WatcherConfig::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        let mut watched = HashSet::new();
        for (_, path) in &self.sources {
            if let Some(dir) = path.parent().filter(|dir| dir.is_dir()) {
                if watched.insert(dir.to_path_buf()) {
                    watcher.watch(dir, RecursiveMode::NonRecursive)?;
                }
            }
        }

        self._watcher = Some(watcher);
        self.start_watcher_task();

        Ok(())
    }

    /// Start the background task that processes file watcher events
    fn start_watcher_task(&mut self) {
        if let Some(mut rx) = self.watcher_rx.take() {
            let settings = self.settings.clone();
            let layers = self.layers.clone();
            let generation = self.generation.clone();
            let sources = self.sources.clone();
            let client = self.client.clone();

            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match event {
                        WatcherEvent::SettingsFileChanged(path) => {
                            report(
                                client.as_ref(),
                                MessageType::INFO,
                                format!("Settings file changed: {}", path.display()),
                            )
                            .await;

                            // Reload every layer; a change can shadow or expose lower layers
                            Self::reload(
                                settings.clone(),
                                layers.clone(),
                                &generation,
                                &sources,
                                client.as_ref(),
                            )
                            .await;
                        }
                        WatcherEvent::WatcherError(e) => {
                            report(
                                client.as_ref(),
                                MessageType::ERROR,
                                format!("Settings file watcher error: {}", e),
                            )
                            .await;
                        }
                    }
                }
            });
        }
    }
}

/// Log locally and, when connected, to the LSP client
async fn report(client: Option<&Client>, level: MessageType, message: String) {
    if level == MessageType::ERROR {
        log::error!("{}", message);
    } else if level == MessageType::WARNING {
        log::warn!("{}", message);
    } else {
        log::info!("{}", message);
    }

    if let Some(client) = client {
        client.log_message(level, message).await;
    }
}
