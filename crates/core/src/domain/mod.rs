pub mod catalog;
pub mod offer;
