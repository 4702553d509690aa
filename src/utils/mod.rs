pub mod reader;
pub mod reader_registry;
pub mod voxel_grid;
