#![allow(clippy::collapsible_else_if)]

pub mod primitives;
pub use primitives::*;
pub mod acc_structures;
pub use acc_structures::*;
pub mod traversal;
pub use traversal::*;

mod timer;
pub use timer::Timer;
