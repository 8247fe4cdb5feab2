pub mod elements;
pub mod geometry;
