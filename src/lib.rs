pub mod cmd;
pub mod conf;
pub mod consts;
pub mod engine;
pub mod signal;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const ENV_CONFIG: &str = "SIMPLEPROXY_CONFIG";
pub const ENV_CONFIG_COMPAT: &str = "GOPROXY_CONFIG";
