pub mod esp32;

pub use esp32::{Esp32, Esp32Error};
