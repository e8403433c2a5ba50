pub mod bicubic;
pub mod contour_table;
pub mod grid_sampler;
pub mod lattice;
pub mod loader;
pub mod marcher;
pub mod partition;
pub mod raster;
pub mod rescaler;
pub mod shared_state;
pub mod utils;
pub mod writer;
