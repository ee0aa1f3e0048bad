//! Prompt fragments, example collections and prompt composition

pub mod composer;
pub mod examples;
pub mod fragment;
pub mod store;

pub use composer::{
    PromptComposer, PromptKind, QueryPromptRecipe, SectionRecipe, METADATA_PARAMETER,
    QUESTION_PARAMETER,
};
pub use examples::{ExampleCollection, ExampleEntry};
pub use fragment::{PromptDefinition, PromptFragment};
pub use store::{default_prompts_dir, PromptStore};
