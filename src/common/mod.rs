pub mod frame;

pub use frame::FramePath;
