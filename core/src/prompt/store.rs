//! Prompt definitions on disk and the cache of composed prompts

use crate::error::{Error, PromptError, Result};
use crate::prompt::composer::{PromptComposer, PromptKind, SCHEMA_METADATA_FRAGMENT};
use crate::prompt::examples::ExampleCollection;
use crate::prompt::fragment::{validate_identifier, PromptFragment};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Extension of prompt definition files
pub const DEFINITION_EXTENSION: &str = "yml";

/// Extension of example collection files
pub const EXAMPLES_EXTENSION: &str = "cypher";

/// Directory with the prompt definitions shipped with the crate
pub fn default_prompts_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts"))
}

/// Loads prompt fragments and example collections from a directory and
/// memoizes the composed prompts.
///
/// Cached prompts are stored before any call-specific value is substituted, so
/// every caller gets the same template with its question placeholder open.
#[derive(Debug)]
pub struct PromptStore {
    directory: PathBuf,
    cache: Mutex<HashMap<PromptKind, Arc<PromptFragment>>>,
}

impl Default for PromptStore {
    fn default() -> Self {
        Self::new(default_prompts_dir())
    }
}

impl PromptStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Load a single definition file by identifier
    pub async fn load(&self, id: &str) -> Result<PromptFragment> {
        validate_identifier(id)?;
        let path = self.definition_path(id, DEFINITION_EXTENSION);
        let source = read_definition(id, &path).await?;
        let fragment = PromptFragment::from_yaml(id, &source)?;

        tracing::debug!(prompt = id, parameters = ?fragment.parameters(), "Loaded prompt fragment");
        Ok(fragment)
    }

    /// Load an example collection by identifier
    pub async fn load_examples(&self, id: &str) -> Result<ExampleCollection> {
        validate_identifier(id)?;
        let path = self.definition_path(id, EXAMPLES_EXTENSION);
        ExampleCollection::load(&path).await
    }

    /// Plain-text description of the graph schema
    pub async fn schema_metadata(&self) -> Result<String> {
        self.load(SCHEMA_METADATA_FRAGMENT).await?.render(&[])
    }

    /// Get a finished prompt, composing it on first use
    pub async fn get(&self, kind: PromptKind) -> Result<Arc<PromptFragment>> {
        let mut cache = self.cache.lock().await;
        if let Some(prompt) = cache.get(&kind) {
            return Ok(Arc::clone(prompt));
        }

        let prompt = match (kind.fragment(), kind.recipe()) {
            (Some(fragment), _) => self.load(fragment).await?,
            (None, Some(recipe)) => PromptComposer::new(self).compose(&recipe).await?,
            (None, None) => {
                return Err(PromptError::UnknownFragment {
                    name: kind.to_string(),
                }
                .into())
            }
        };

        tracing::debug!(kind = %kind, "Composed prompt");
        let prompt = Arc::new(prompt);
        cache.insert(kind, Arc::clone(&prompt));
        Ok(prompt)
    }

    /// Compose every prompt once so definition defects surface at startup
    pub async fn preload(&self) -> Result<()> {
        for kind in PromptKind::all() {
            self.get(kind).await?;
        }
        Ok(())
    }

    fn definition_path(&self, id: &str, extension: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", id, extension))
    }
}

async fn read_definition(id: &str, path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(source) => Ok(source),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PromptError::UnknownFragment {
            name: id.to_string(),
        }
        .into()),
        Err(e) => Err(Error::Io(e)),
    }
}
