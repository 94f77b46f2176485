pub mod config;
pub mod models;
pub mod error;
pub mod schema;
pub mod api;
pub mod generator;
pub mod navigator;
pub mod app;
pub mod tts;
pub mod logging;
pub mod ui;

pub use config::Config;
pub use models::*;
pub use error::{GenerationError, ServiceError};
pub use generator::DeckGenerator;
pub use navigator::DeckNavigator;
pub use app::StudyApp;
