//! Prompt persistence.

pub mod file;

pub use file::JsonFileStore;

use async_trait::async_trait;
use promptdock_common::protocol::{PromptInput, PromptPatch, PromptRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Prompt {0} not found")]
    NotFound(u64),

    #[error("Import expects a JSON array of prompts")]
    NotAnArray,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Store a new prompt and return its id.
    async fn create(&self, input: PromptInput) -> Result<u64, StoreError>;

    async fn get(&self, id: u64) -> Result<Option<PromptRecord>, StoreError>;

    /// Every prompt, in insertion order.
    async fn list(&self) -> Result<Vec<PromptRecord>, StoreError>;

    /// Apply `patch` and bump `updated_at`.
    async fn update(&self, id: u64, patch: PromptPatch) -> Result<PromptRecord, StoreError>;

    /// Returns whether a prompt was removed.
    async fn delete(&self, id: u64) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptOrder {
    /// Most recently created first.
    #[default]
    Newest,
    /// Alphabetical by name, ignoring case.
    Name,
}

impl std::str::FromStr for PromptOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Ok(PromptOrder::Newest),
            "name" => Ok(PromptOrder::Name),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Case-insensitive substring match over name and content. An empty query
/// keeps everything.
pub fn search(prompts: Vec<PromptRecord>, query: &str) -> Vec<PromptRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return prompts;
    }
    prompts
        .into_iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&query) || p.content.to_lowercase().contains(&query)
        })
        .collect()
}

pub fn sort(prompts: &mut [PromptRecord], order: PromptOrder) {
    match order {
        PromptOrder::Newest => {
            prompts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
        }
        PromptOrder::Name => prompts.sort_by_key(|p| p.name.to_lowercase()),
    }
}

/// Every prompt as a pretty-printed JSON array.
pub async fn export_json<S: PromptStore + ?Sized>(store: &S) -> Result<String, StoreError> {
    let prompts = store.list().await?;
    Ok(serde_json::to_string_pretty(&prompts)?)
}

/// Re-create every prompt of an exported array with fresh ids and
/// timestamps. Returns the new ids.
pub async fn import_json<S: PromptStore + ?Sized>(
    store: &S,
    json: &str,
) -> Result<Vec<u64>, StoreError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Array(items) = value else {
        return Err(StoreError::NotAnArray);
    };

    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let input: PromptInput = serde_json::from_value(item)?;
        ids.push(store.create(input).await?);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, name: &str, content: &str, created_at: i64) -> PromptRecord {
        PromptRecord {
            id,
            name: name.into(),
            content: content.into(),
            category: None,
            model: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_search_matches_name_and_content() {
        let prompts = vec![
            record(1, "Translate", "Into French", 1),
            record(2, "Review", "Check this CODE", 2),
            record(3, "Summary", "tl;dr", 3),
        ];
        let hits = search(prompts.clone(), "code");
        assert_eq!(hits.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2]);

        let hits = search(prompts.clone(), "TRANS");
        assert_eq!(hits.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);

        assert_eq!(search(prompts, "  ").len(), 3);
    }

    #[test]
    fn test_sort_orders() {
        let mut prompts = vec![
            record(1, "beta", "", 10),
            record(2, "alpha", "", 30),
            record(3, "gamma", "", 20),
        ];
        sort(&mut prompts, PromptOrder::Newest);
        assert_eq!(prompts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 3, 1]);

        sort(&mut prompts, PromptOrder::Name);
        assert_eq!(prompts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 1, 3]);
    }

    #[test]
    fn test_order_parsing() {
        assert_eq!("Name".parse::<PromptOrder>().unwrap(), PromptOrder::Name);
        assert!("oldest".parse::<PromptOrder>().is_err());
    }
}
