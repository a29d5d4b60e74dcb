mod app;
mod config;
mod fanout;
mod http;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use fanout::FanoutError;
pub use http::HttpError;
pub use validation::ValidationError;
