use super::{PromptStore, StoreError};
use async_trait::async_trait;
use promptdock_common::protocol::{PromptInput, PromptPatch, PromptRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::debug;

/// On-disk layout. Ids are never reused, even after a delete.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    next_id: u64,
    prompts: Vec<PromptRecord>,
}

/// All prompts in one JSON file, rewritten atomically on every change.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<StoreFile, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(StoreFile::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, file: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Wrote {} prompts to {}", file.prompts.len(), self.path.display());
        Ok(())
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[async_trait]
impl PromptStore for JsonFileStore {
    async fn create(&self, input: PromptInput) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;

        let id = file
            .next_id
            .max(file.prompts.iter().map(|p| p.id).max().unwrap_or(0))
            + 1;
        let now = now_millis();
        file.prompts.push(PromptRecord {
            id,
            name: input.name,
            content: input.content,
            category: input.category,
            model: input.model,
            created_at: now,
            updated_at: now,
        });
        file.next_id = id;

        self.write(&file).await?;
        Ok(id)
    }

    async fn get(&self, id: u64) -> Result<Option<PromptRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let file = self.read().await?;
        Ok(file.prompts.into_iter().find(|p| p.id == id))
    }

    async fn list(&self) -> Result<Vec<PromptRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.prompts)
    }

    async fn update(&self, id: u64, patch: PromptPatch) -> Result<PromptRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;

        let record = file
            .prompts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(content) = patch.content {
            record.content = content;
        }
        if let Some(category) = patch.category {
            record.category = Some(category);
        }
        if let Some(model) = patch.model {
            record.model = Some(model);
        }
        record.updated_at = now_millis().max(record.updated_at + 1);
        let updated = record.clone();

        self.write(&file).await?;
        Ok(updated)
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;

        let before = file.prompts.len();
        file.prompts.retain(|p| p.id != id);
        if file.prompts.len() == before {
            return Ok(false);
        }
        self.write(&file).await?;
        Ok(true)
    }
}
