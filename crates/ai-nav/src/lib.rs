//! Tile-graph navigation: grid construction, A* search and cell raycasts.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod error;
pub mod grid;
pub mod math;
pub mod navigator;

pub use error::GridError;
pub use grid::{GridSpec, SearchOrder, SearchStats, Tile, TileGraph};
pub use math::{Aabb, Vec2};
pub use navigator::{NavPath, NavRaycastHit, Navigator};
