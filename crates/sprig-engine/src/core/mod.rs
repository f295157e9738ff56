pub mod node;
pub mod scene;
pub mod time;
