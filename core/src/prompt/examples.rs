//! Few-shot example collections
//!
//! A collection file holds blocks separated by blank lines. Inside a block,
//! lines starting with `//` describe the example and every other line is part
//! of the query.

use crate::error::{Error, PromptError, Result};
use crate::prompt::fragment::validate_identifier;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static SECTION_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid separator regex"));

const COMMENT_PREFIX: &str = "//";

/// One example: a natural-language description and the query that answers it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleEntry {
    pub description: String,
    pub query_text: String,
}

/// Ordered set of example entries, injected into a prompt under `placeholder`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleCollection {
    name: String,
    placeholder: String,
    entries: Vec<ExampleEntry>,
}

impl ExampleCollection {
    /// Parse collection text. The placeholder defaults to the collection name.
    pub fn parse(name: impl Into<String>, content: &str) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;

        let content = content.trim();
        let entries = if content.is_empty() {
            Vec::new()
        } else {
            SECTION_SEPARATOR.split(content).map(parse_section).collect()
        };

        Ok(Self {
            placeholder: name.clone(),
            name,
            entries,
        })
    }

    /// Load a collection file; its name is the file stem
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| Error::Generic(format!("Invalid example file name: {}", path.display())))?;

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PromptError::UnknownFragment {
                    name: name.to_string(),
                }
                .into())
            }
            Err(e) => return Err(Error::Io(e)),
        };
        let collection = Self::parse(name, &content)?;

        tracing::debug!(
            collection = %collection.name,
            entries = collection.entries.len(),
            "Loaded example collection"
        );
        Ok(collection)
    }

    /// Inject under a placeholder other than the collection name
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Result<Self> {
        let placeholder = placeholder.into();
        validate_identifier(&placeholder)?;
        self.placeholder = placeholder;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn entries(&self) -> &[ExampleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All query texts in file order
    pub fn queries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.query_text.as_str())
    }

    /// Render as a numbered list of fenced code blocks.
    ///
    /// The fence of the last entry is left open; the prompt template that
    /// receives the block closes it.
    pub fn format_as_markdown(&self) -> String {
        let last = self.entries.len().saturating_sub(1);
        let mut lines = Vec::with_capacity(self.entries.len() * 4);

        for (i, entry) in self.entries.iter().enumerate() {
            lines.push(format!("{}. {}", i, entry.description));
            lines.push("```cypher".to_string());
            lines.push(entry.query_text.clone());
            if i < last {
                lines.push("```\n".to_string());
            }
        }

        lines.join("\n")
    }
}

fn parse_section(section: &str) -> ExampleEntry {
    let mut description = Vec::new();
    let mut query = Vec::new();

    for line in section.trim().lines() {
        match line.strip_prefix(COMMENT_PREFIX) {
            Some(comment) => description.push(comment.trim()),
            None => query.push(line.trim()),
        }
    }

    ExampleEntry {
        description: description.join("\n"),
        query_text: query.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CORPUS: &str = "\
// Which substances were measured at sites in Germany?
MATCH (s:Substance)-[:MEASURED_AT]->(site:Site)
WHERE site.country = 'Germany'
RETURN DISTINCT s.name


// Show the driver importance
// for Diuron
MATCH (s:Substance {name: 'Diuron'})-[r:IS_DRIVER]->(site:Site)
  RETURN site.name, r.driver_importance
";

    #[test]
    fn test_parse_sections() {
        let collection = ExampleCollection::parse("cypher_fewshot_examples_general", CORPUS).unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.placeholder(), "cypher_fewshot_examples_general");

        let first = &collection.entries()[0];
        assert_eq!(
            first.description,
            "Which substances were measured at sites in Germany?"
        );
        assert_eq!(
            first.query_text,
            "MATCH (s:Substance)-[:MEASURED_AT]->(site:Site)\nWHERE site.country = 'Germany'\nRETURN DISTINCT s.name"
        );

        let second = &collection.entries()[1];
        assert_eq!(second.description, "Show the driver importance\nfor Diuron");
        assert!(second.query_text.ends_with("\nRETURN site.name, r.driver_importance"));
    }

    #[test]
    fn test_empty_corpus_has_no_entries() {
        let collection = ExampleCollection::parse("cypher_fewshot_examples_map", "  \n\n \n").unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.format_as_markdown(), "");
    }

    #[test]
    fn test_format_as_markdown() {
        let collection = ExampleCollection::parse("cypher_fewshot_examples_general", CORPUS).unwrap();
        let markdown = collection.format_as_markdown();

        let expected = format!(
            "0. Which substances were measured at sites in Germany?\n```cypher\n{}\n```\n\n1. Show the driver importance\nfor Diuron\n```cypher\n{}",
            collection.entries()[0].query_text,
            collection.entries()[1].query_text
        );
        assert_eq!(markdown, expected);
        assert!(!markdown.ends_with("```"));
    }

    #[test]
    fn test_placeholder_override_is_validated() {
        let collection = ExampleCollection::parse("cypher_fewshot_examples_map", CORPUS).unwrap();

        let renamed = collection.clone().with_placeholder("examples").unwrap();
        assert_eq!(renamed.placeholder(), "examples");
        assert_eq!(renamed.name(), "cypher_fewshot_examples_map");

        let err = collection.with_placeholder("Examples!").unwrap_err();
        assert!(matches!(
            err,
            Error::Prompt(PromptError::MalformedIdentifier { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_uses_file_stem() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cypher_fewshot_examples_general.cypher");
        tokio::fs::write(&path, CORPUS).await.unwrap();

        let collection = ExampleCollection::load(&path).await.unwrap();
        assert_eq!(collection.name(), "cypher_fewshot_examples_general");
        assert_eq!(collection.queries().count(), 2);
    }
}
