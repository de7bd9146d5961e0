pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_dir, DataLoadError};
pub use schema::GameConfig;
