pub mod core;
pub mod render;
pub mod services;
pub mod utils;
