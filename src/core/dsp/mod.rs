//! Digital Signal Processing utilities

pub mod fft;
pub mod stats;
pub mod windows;

pub use fft::StftProcessor;
pub use windows::{create_window, WindowType};
