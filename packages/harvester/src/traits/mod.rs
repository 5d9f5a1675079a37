//! Trait seams between the harvester core and its collaborators.
//!
//! The core never talks to a network service or a storage format directly;
//! it goes through these traits so adapters can be swapped and mocked.

pub mod backend;
pub mod document;
pub mod feed;
pub mod reasoning;
