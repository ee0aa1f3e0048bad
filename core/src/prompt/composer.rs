//! Assembly of the query-generation prompts from stored fragments

use crate::error::{PromptError, Result};
use crate::prompt::fragment::PromptFragment;
use crate::prompt::store::PromptStore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder left open in every query-generation prompt
pub const QUESTION_PARAMETER: &str = "question";

/// Placeholder that receives the graph schema description
pub const METADATA_PARAMETER: &str = "meta";

/// Definition file holding the graph schema description
pub const SCHEMA_METADATA_FRAGMENT: &str = "graph_schema_metadata";

/// The finished prompts the application hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// System prompt of the conversational agent
    Agent,
    /// Query generation for tabular answers
    CypherGeneral,
    /// Query generation for map answers
    CypherMap,
}

impl PromptKind {
    pub fn all() -> [PromptKind; 3] {
        [
            PromptKind::Agent,
            PromptKind::CypherGeneral,
            PromptKind::CypherMap,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Agent => "agent",
            PromptKind::CypherGeneral => "cypher_general",
            PromptKind::CypherMap => "cypher_map",
        }
    }

    /// How the prompt is assembled, `None` for prompts that are a single fragment
    pub fn recipe(&self) -> Option<QueryPromptRecipe> {
        match self {
            PromptKind::Agent => None,
            PromptKind::CypherGeneral => Some(QueryPromptRecipe {
                base: "prompt_cypher_general",
                sections: vec![
                    SectionRecipe::plain("basic_intro"),
                    SectionRecipe::plain("cypher_intro"),
                    SectionRecipe::with_includes(
                        "cypher_instructions_general",
                        &["cypher_instructions"],
                    ),
                ],
                examples: "cypher_fewshot_examples_general",
            }),
            PromptKind::CypherMap => Some(QueryPromptRecipe {
                base: "prompt_cypher_map",
                sections: vec![
                    SectionRecipe::plain("basic_intro"),
                    SectionRecipe::plain("cypher_intro"),
                    SectionRecipe::with_includes(
                        "cypher_instructions_map",
                        &["cypher_instructions"],
                    ),
                ],
                examples: "cypher_fewshot_examples_map",
            }),
        }
    }

    /// Definition file of single-fragment prompts
    pub fn fragment(&self) -> Option<&'static str> {
        match self {
            PromptKind::Agent => Some("basic_intro"),
            _ => None,
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fragment substituted into the base prompt, optionally after filling in
/// shared fragments of its own
#[derive(Debug, Clone)]
pub struct SectionRecipe {
    pub name: &'static str,
    pub includes: Vec<&'static str>,
}

impl SectionRecipe {
    pub fn plain(name: &'static str) -> Self {
        Self {
            name,
            includes: Vec::new(),
        }
    }

    pub fn with_includes(name: &'static str, includes: &[&'static str]) -> Self {
        Self {
            name,
            includes: includes.to_vec(),
        }
    }
}

/// Base template, ordered sections, example collection and schema metadata
/// that make up one query-generation prompt
#[derive(Debug, Clone)]
pub struct QueryPromptRecipe {
    pub base: &'static str,
    pub sections: Vec<SectionRecipe>,
    pub examples: &'static str,
}

/// Builds composite prompts out of a [`PromptStore`]
pub struct PromptComposer<'a> {
    store: &'a PromptStore,
}

impl<'a> PromptComposer<'a> {
    pub fn new(store: &'a PromptStore) -> Self {
        Self { store }
    }

    /// Compose a query-generation prompt.
    ///
    /// Sections are applied in recipe order, then the examples, then the schema
    /// metadata. The result must leave exactly the question placeholder open.
    pub async fn compose(&self, recipe: &QueryPromptRecipe) -> Result<PromptFragment> {
        let mut prompt = self.store.load(recipe.base).await?;

        for section in &recipe.sections {
            let mut fragment = self.store.load(section.name).await?;
            for include in &section.includes {
                let included = self.store.load(include).await?;
                fragment = fragment.partial_apply_fragment(&included)?;
            }
            prompt = prompt.partial_apply_fragment(&fragment)?;
            tracing::trace!(base = recipe.base, section = section.name, "Applied prompt section");
        }

        let examples = self.store.load_examples(recipe.examples).await?;
        prompt = prompt.inject_examples(&examples)?;

        let metadata = self.store.schema_metadata().await?;
        prompt = prompt.partial_apply_literal(&[(METADATA_PARAMETER, &metadata)])?;

        let leftover: Vec<String> = prompt
            .parameters()
            .iter()
            .filter(|p| p.as_str() != QUESTION_PARAMETER)
            .cloned()
            .collect();
        if !leftover.is_empty() {
            return Err(PromptError::InvalidDefinition {
                name: recipe.base.to_string(),
                message: format!(
                    "composed prompt leaves unexpected placeholders open: {}",
                    leftover.join(", ")
                ),
            }
            .into());
        }
        if !prompt.has_parameter(QUESTION_PARAMETER) {
            return Err(PromptError::MissingPlaceholder {
                prompt: recipe.base.to_string(),
                placeholder: QUESTION_PARAMETER.to_string(),
            }
            .into());
        }

        Ok(prompt)
    }
}
