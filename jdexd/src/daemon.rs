use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use jdex_core::Settings;
use serde::Serialize;
use tokio::task::{JoinError, JoinSet};

use crate::host::{FsTree, StructuralChange};
use crate::sync::backoff::Backoff;
use crate::sync::local_watcher::start_notify_watcher;
use crate::sync::{
    DesktopNotifier, Engine, EngineError, LogNotifier, MutationReport, Notifier, RenameStatus,
    RetryPolicy,
};

const DEFAULT_ROOT_DIR_NAME: &str = "JDex";
const DEFAULT_RENAME_ATTEMPTS: u64 = 3;
const DEFAULT_RENAME_BACKOFF_MS: u64 = 20;
const DEFAULT_RENAME_BACKOFF_MAX_MS: u64 = 80;
const DEFAULT_ECHO_WINDOW_MS: u64 = 2_000;

#[derive(Clone, Debug, Serialize)]
pub struct DaemonConfig {
    pub root: PathBuf,
    pub settings: Settings,
    pub rename_attempts: u32,
    pub rename_backoff_ms: u64,
    pub rename_backoff_max_ms: u64,
    pub desktop_notifications: bool,
    pub echo_window_ms: u64,
}

impl DaemonConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let home = dirs::home_dir().context("home directory is unavailable")?;
        let root = std::env::var("JDEX_ROOT")
            .ok()
            .map(|value| expand_with_home(&value, &home))
            .unwrap_or_else(|| home.join(DEFAULT_ROOT_DIR_NAME));
        let rename_attempts =
            u32::try_from(read_u64_env("JDEX_RENAME_ATTEMPTS", DEFAULT_RENAME_ATTEMPTS))
                .unwrap_or(DEFAULT_RENAME_ATTEMPTS as u32);

        Ok(Self {
            root,
            settings: settings_from_env(),
            rename_attempts,
            rename_backoff_ms: read_u64_env("JDEX_RENAME_BACKOFF_MS", DEFAULT_RENAME_BACKOFF_MS),
            rename_backoff_max_ms: read_u64_env(
                "JDEX_RENAME_BACKOFF_MAX_MS",
                DEFAULT_RENAME_BACKOFF_MAX_MS,
            ),
            desktop_notifications: read_bool_env("JDEX_DESKTOP_NOTIFICATIONS", true),
            echo_window_ms: read_u64_env("JDEX_ECHO_WINDOW_MS", DEFAULT_ECHO_WINDOW_MS),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.rename_attempts,
            Backoff::new(
                Duration::from_millis(self.rename_backoff_ms),
                Duration::from_millis(self.rename_backoff_max_ms.max(self.rename_backoff_ms)),
                true,
            ),
        )
    }

    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }
}

type DaemonEngine = Engine<FsTree, Box<dyn Notifier>>;
type MutationTask = Result<Result<MutationReport, EngineError>, JoinError>;

pub struct DaemonRuntime {
    config: DaemonConfig,
    host: Arc<FsTree>,
    engine: Arc<DaemonEngine>,
}

impl DaemonRuntime {
    pub async fn bootstrap(config: DaemonConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&config.root)
            .await
            .with_context(|| format!("failed to create tree root at {:?}", config.root))?;

        let host = Arc::new(FsTree::new(&config.root).with_echo_window(config.echo_window()));
        let notifier: Box<dyn Notifier> = if config.desktop_notifications {
            Box::new(DesktopNotifier::default())
        } else {
            Box::new(LogNotifier)
        };
        let engine = Arc::new(Engine::new(
            Arc::clone(&host),
            notifier,
            config.settings,
            config.retry_policy(),
        ));
        Ok(Self {
            config,
            host,
            engine,
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            root = %self.config.root.display(),
            settings = ?self.config.settings,
            "started"
        );
        let (_watcher, mut changes) = start_notify_watcher(&self.config.root)
            .with_context(|| format!("failed to watch {}", self.config.root.display()))?;
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupt received, shutting down");
                    break;
                }
                change = changes.recv() => {
                    let Some(change) = change else {
                        tracing::warn!("watcher stopped");
                        break;
                    };
                    self.dispatch(change, &mut tasks);
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_mutation(joined);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            log_mutation(joined);
        }
        Ok(())
    }

    fn dispatch(
        &self,
        change: StructuralChange,
        tasks: &mut JoinSet<Result<MutationReport, EngineError>>,
    ) {
        if self.host.take_echo(&change) {
            tracing::debug!(path = %change.path, "dropping echo of own rename");
            return;
        }
        let Some(admission) = self.engine.admit(&change) else {
            return;
        };
        tracing::debug!(path = %change.path, old_path = ?change.old_path, "admitted");
        let engine = Arc::clone(&self.engine);
        tasks.spawn(async move { engine.process(admission, change).await });
    }
}

include!("daemon_helpers.rs");

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
