pub mod access;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod server;
pub mod translate;

pub use access::{authorize, classify_address, AccessConfig, AccessDecision};
pub use config::GatewayConfig;
pub use credentials::{Credential, CredentialProvider, FileCredentialProvider};
pub use error::{GatewayError, Result};
pub use logging::SharedLogger;
pub use server::{build_router, AppState};
