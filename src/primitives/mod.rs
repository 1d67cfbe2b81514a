pub mod aabb;
pub use aabb::*;
pub mod triangle;
pub use triangle::*;
pub mod ray;
pub use ray::*;
