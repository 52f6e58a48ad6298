use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("settings: {0}")]
    Settings(#[from] config::ConfigError),
    #[error("database: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("engine: {0}")]
    Engine(#[from] engine::EngineError),
    #[error("logging: {0}")]
    Logging(String),
}
