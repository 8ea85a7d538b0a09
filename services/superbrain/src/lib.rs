pub mod adapters;
pub mod brain;
pub mod config;
pub mod error;

pub use brain::{
    BuildOptions, ChatSession, ChatSettings, ContextAggregator, ExtractionCache, Grounding,
    Superbrain,
};
pub use config::{Config, ConfigError, Persona};
pub use error::HubError;
