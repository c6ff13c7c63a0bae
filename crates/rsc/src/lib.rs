pub mod commands;
pub mod raster;
pub mod target;
