pub mod atlas;
pub mod meta;

// Curated re-exports
pub use atlas::{pack_directory, write_outputs, AtlasArtifact, CellSizePolicy, GridDescriptor, PackConfig};
pub use meta::{read_cell_tags, save_with_cell_tags};
