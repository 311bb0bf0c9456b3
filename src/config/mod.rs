mod engine;
mod settings;

pub use engine::{CONFIG_FILENAME, ConfigEngine};
pub use settings::Settings;
