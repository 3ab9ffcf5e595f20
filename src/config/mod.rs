mod server;

pub use server::{DEFAULT_PLATFORM_SUFFIX, ServerConfig};
