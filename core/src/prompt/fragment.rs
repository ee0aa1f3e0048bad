//! Prompt fragments and the composition operations on them
//!
//! A fragment is a named block of template text with `{name}` placeholders.
//! Double braces (`{{`, `}}`) are literal braces and are only unescaped by the
//! final [`PromptFragment::render`] call. Every composition operation returns a
//! new fragment; fragments are never mutated in place, so a cached composite can
//! be shared freely between callers.

use crate::error::{PromptError, Result};
use crate::prompt::examples::ExampleCollection;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

/// Escaped braces or a `{identifier}` placeholder, leftmost match first
static TEMPLATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid template regex")
});

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]+$").expect("valid identifier regex"));

/// Check that a fragment or example collection name only uses lowercase
/// letters and underscores.
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(PromptError::MalformedIdentifier {
            name: name.to_string(),
        }
        .into())
    }
}

/// On-disk shape of a prompt definition file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Template text
    pub prompt: String,

    /// Placeholders the template expects, if any
    #[serde(default)]
    pub parameters: Option<Vec<String>>,
}

/// A named unit of prompt text together with its unresolved placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFragment {
    name: String,
    text: String,
    parameters: BTreeSet<String>,
}

impl PromptFragment {
    /// Create a fragment, validating its name and declared placeholders
    pub fn new<N, T, I, P>(name: N, text: T, parameters: I) -> Result<Self>
    where
        N: Into<String>,
        T: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let name = name.into();
        validate_identifier(&name)?;

        let text = text.into();
        let parameters: BTreeSet<String> = parameters.into_iter().map(Into::into).collect();

        if let Some(undeclared) = placeholders(&text)
            .into_iter()
            .find(|placeholder| !parameters.contains(*placeholder))
        {
            return Err(PromptError::UndeclaredPlaceholder {
                prompt: name,
                placeholder: undeclared.to_string(),
            }
            .into());
        }

        Ok(Self {
            name,
            text,
            parameters,
        })
    }

    /// Parse a YAML definition document with a `prompt` key and an optional
    /// `parameters` list.
    pub fn from_yaml(name: &str, source: &str) -> Result<Self> {
        validate_identifier(name)?;

        let definition: PromptDefinition =
            serde_yaml::from_str(source).map_err(|e| PromptError::InvalidDefinition {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        Self::new(
            name,
            definition.prompt,
            definition.parameters.unwrap_or_default(),
        )
    }

    /// Name of the fragment, also the placeholder it fills in a parent fragment
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current template text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Placeholders that still need a value
    pub fn parameters(&self) -> &BTreeSet<String> {
        &self.parameters
    }

    pub fn has_parameter(&self, parameter: &str) -> bool {
        self.parameters.contains(parameter)
    }

    pub fn has_parameters<'a>(&self, parameters: impl IntoIterator<Item = &'a str>) -> bool {
        parameters.into_iter().all(|p| self.parameters.contains(p))
    }

    /// Concatenate `other` after this fragment, separated by a newline.
    ///
    /// Appending a fragment to itself is rejected.
    pub fn append(&self, other: &PromptFragment) -> Result<Self> {
        if std::ptr::eq(self, other) {
            return Err(PromptError::SelfAppend {
                prompt: self.name.clone(),
            }
            .into());
        }

        Ok(Self {
            name: self.name.clone(),
            text: format!("{}\n{}", self.text, other.text),
            parameters: self.parameters.union(&other.parameters).cloned().collect(),
        })
    }

    /// Substitute some placeholders and keep every other one intact.
    ///
    /// All keys must be unresolved parameters of this fragment.
    pub fn partial_apply(&self, values: &[(&str, &str)]) -> Result<Self> {
        if let Some((unknown, _)) = values.iter().find(|(key, _)| !self.has_parameter(key)) {
            return Err(PromptError::UnknownParameter {
                prompt: self.name.clone(),
                parameter: unknown.to_string(),
            }
            .into());
        }

        let lookup: HashMap<&str, &str> = values.iter().copied().collect();
        let text = TEMPLATE_TOKEN.replace_all(&self.text, |caps: &Captures| {
            match caps.get(1).and_then(|name| lookup.get(name.as_str())) {
                Some(value) => (*value).to_string(),
                None => caps[0].to_string(),
            }
        });

        let mut parameters = self.parameters.clone();
        for key in lookup.keys() {
            parameters.remove(*key);
        }

        Ok(Self {
            name: self.name.clone(),
            text: text.into_owned(),
            parameters,
        })
    }

    /// Like [`partial_apply`](Self::partial_apply), but the values are plain
    /// text. Their braces are escaped so `render` gives them back unchanged.
    pub fn partial_apply_literal(&self, values: &[(&str, &str)]) -> Result<Self> {
        let escaped: Vec<(&str, String)> = values
            .iter()
            .map(|(key, value)| (*key, escape_braces(value)))
            .collect();
        let borrowed: Vec<(&str, &str)> = escaped
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .collect();
        self.partial_apply(&borrowed)
    }

    /// Fill the placeholder named after `fragment` with its text and take over
    /// its remaining parameters.
    pub fn partial_apply_fragment(&self, fragment: &PromptFragment) -> Result<Self> {
        let applied = self.partial_apply(&[(fragment.name(), fragment.text())])?;
        Ok(Self {
            parameters: applied
                .parameters
                .union(&fragment.parameters)
                .cloned()
                .collect(),
            ..applied
        })
    }

    /// Replace the collection's placeholder with its Markdown example block
    pub fn inject_examples(&self, examples: &ExampleCollection) -> Result<Self> {
        if examples.is_empty() {
            return Err(PromptError::EmptyExampleCollection {
                collection: examples.name().to_string(),
            }
            .into());
        }

        let placeholder = examples.placeholder();
        if !self.has_parameter(placeholder) {
            return Err(PromptError::MissingPlaceholder {
                prompt: self.name.clone(),
                placeholder: placeholder.to_string(),
            }
            .into());
        }

        self.partial_apply_literal(&[(placeholder, &examples.format_as_markdown())])
    }

    /// Produce the final prompt string.
    ///
    /// Every remaining parameter needs a value. Escaped braces are unescaped here
    /// and nowhere else.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String> {
        if let Some((unknown, _)) = values.iter().find(|(key, _)| !self.has_parameter(key)) {
            return Err(PromptError::UnknownParameter {
                prompt: self.name.clone(),
                parameter: unknown.to_string(),
            }
            .into());
        }

        let lookup: HashMap<&str, &str> = values.iter().copied().collect();
        let missing: Vec<String> = self
            .parameters
            .iter()
            .filter(|p| !lookup.contains_key(p.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PromptError::MissingParameters {
                prompt: self.name.clone(),
                parameters: missing,
            }
            .into());
        }

        let rendered = TEMPLATE_TOKEN.replace_all(&self.text, |caps: &Captures| match &caps[0] {
            "{{" => "{".to_string(),
            "}}" => "}".to_string(),
            token => caps
                .get(1)
                .and_then(|name| lookup.get(name.as_str()))
                .map(|value| (*value).to_string())
                .unwrap_or_else(|| token.to_string()),
        });

        Ok(rendered.into_owned())
    }
}

fn escape_braces(value: &str) -> String {
    value.replace('{', "{{").replace('}', "}}")
}

/// Placeholder names used literally in a template, skipping escaped braces
pub fn placeholders(text: &str) -> Vec<&str> {
    TEMPLATE_TOKEN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}
