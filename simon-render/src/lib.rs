pub mod render;

pub use render::{BoardLayout, BoardRenderer};
