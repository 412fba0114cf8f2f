pub mod bom;
pub mod config;
pub mod logging;

pub use self::bom::*;
pub use self::config::*;
pub use self::logging::*;
