pub mod image;
pub mod registry;
pub mod simplez80;

pub use image::{ImageLoadError, ProgramImage};
pub use simplez80::{PinBoard, SimpleZ80System};
