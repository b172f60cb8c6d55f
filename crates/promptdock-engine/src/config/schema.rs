use crate::inject::Timings;
use promptdock_common::error::RegistryError;
use promptdock_common::sites::{SiteProfile, SiteRegistry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockConfig {
    /// Extra site profiles, consulted before the built-in table.
    #[serde(default)]
    pub sites: Vec<SiteProfile>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl DockConfig {
    pub fn registry(&self) -> Result<SiteRegistry, RegistryError> {
        SiteRegistry::with_overrides(self.sites.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    #[serde(default = "default_deferred_ms")]
    pub deferred_ms: u64,
    #[serde(default = "default_corrective_ms")]
    pub corrective_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            stagger_ms: default_stagger_ms(),
            deferred_ms: default_deferred_ms(),
            corrective_ms: default_corrective_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl TimingConfig {
    pub fn timings(&self) -> Timings {
        Timings {
            stagger: Duration::from_millis(self.stagger_ms),
            deferred: Duration::from_millis(self.deferred_ms),
            corrective: Duration::from_millis(self.corrective_ms),
            settle: Duration::from_millis(self.settle_ms),
        }
    }
}

fn default_stagger_ms() -> u64 {
    10
}

fn default_deferred_ms() -> u64 {
    50
}

fn default_corrective_ms() -> u64 {
    150
}

fn default_settle_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".promptdock").join("prompts.json"),
        None => PathBuf::from("./prompts.json"),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub visible: bool,
    /// Chromium profile directory; a fresh one per process when unset.
    #[serde(default)]
    pub user_data_dir: Option<PathBuf>,
}
