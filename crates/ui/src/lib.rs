pub mod render;
pub mod state;
pub mod vm;

pub use state::ViewError;
