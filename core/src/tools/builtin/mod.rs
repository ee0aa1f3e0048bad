//! Built-in tools

pub mod cypher_search;
pub mod geographic_map;
pub mod wikipedia;

pub use cypher_search::{CypherSearchTool, CypherSearchToolFactory};
pub use geographic_map::{GeographicMapTool, GeographicMapToolFactory};
pub use wikipedia::{WikipediaTool, WikipediaToolFactory};
