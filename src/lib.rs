pub mod config;
pub mod ddragon;
pub mod error;
pub mod geometry;
pub mod lcu;
pub mod logging;
pub mod orchestrator;
pub mod window;
pub mod worker;
