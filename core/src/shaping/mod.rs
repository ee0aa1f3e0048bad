//! Shaping of graph results into tool responses

pub mod describe;
pub mod figure;
pub mod map;
pub mod table;

pub use describe::{describe, median};
pub use figure::{europe_geo_layout, Figure};
pub use map::{MapKind, MapShape, MapSite};
pub use table::TableShape;
