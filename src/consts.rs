// default config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "simpleproxy.json";

// still picked up when it is the only config file around
pub const COMPAT_CONFIG_FILE: &str = "goproxy.json";

// default logfile
pub const DEFAULT_LOG_FILE: &str = "stdout";

// rule written into a generated config
pub const DEFAULT_LOCAL: &str = "127.0.0.1:8080";
pub const DEFAULT_REMOTE: &str = "127.0.0.1:8081";
pub const DEFAULT_TYPE: &str = "both";
