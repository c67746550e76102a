//! Configuration document.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use simpleproxy_core::rule::Rule;

use crate::consts::{DEFAULT_LOCAL, DEFAULT_REMOTE, DEFAULT_TYPE};

/// Conf fields that may be overridden from the command line.
pub trait Config {
    type Output;

    fn is_empty(&self) -> bool;

    fn build(self) -> Self::Output;

    // override self if other not empty
    fn rst_field(&mut self, other: &Self) -> &mut Self;

    fn from_cmd_args(matches: &clap::ArgMatches) -> Self;
}

macro_rules! empty {
    ( $this: expr => $( $field: ident ),* ) => {{
        let mut res = true;
        $(
            res = res && $this.$field.is_none();
        )*
        res
    }};
}

macro_rules! rst {
    ($this: ident, $field: ident, $other: ident) => {
        if let Some(x) = $other.$field.clone() {
            $this.$field = Some(x);
        }
    };
}

mod log;
pub use self::log::{LogLevel, LogConf};

mod net;
pub use net::NetConf;

mod rule;
pub use rule::RuleConf;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("unable to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("missing remote address")]
    MissingRemote,

    #[error("invalid remote address: {0}")]
    InvalidRemote(String),

    #[error("invalid local address derived from remote {0}")]
    InvalidLocal(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullConf {
    #[serde(default)]
    #[serde(skip_serializing_if = "Config::is_empty")]
    pub log: LogConf,

    #[serde(default)]
    #[serde(skip_serializing_if = "Config::is_empty")]
    pub network: NetConf,

    #[serde(default)]
    pub proxy: Vec<RuleConf>,
}

fn is_toml(path: &str) -> bool {
    Path::new(path)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"))
}

impl FullConf {
    /// The document written when no config file exists.
    pub fn generated() -> Self {
        FullConf {
            proxy: vec![RuleConf {
                local: Some(String::from(DEFAULT_LOCAL)),
                remote: Some(String::from(DEFAULT_REMOTE)),
                mode: Some(String::from(DEFAULT_TYPE)),
            }],
            ..Default::default()
        }
    }

    /// Read a config file, as toml if it ends with `.toml`, as json5 otherwise.
    ///
    /// json5 takes plain json too, along with comments and trailing commas.
    pub fn from_conf_file(path: &str) -> Result<Self, ConfigError> {
        let conf = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;

        let parsed = if is_toml(path) {
            toml::from_str(&conf).map_err(|e| e.to_string())
        } else {
            json5::from_str(&conf).map_err(|e| e.to_string())
        };

        parsed.map_err(|reason| ConfigError::Parse {
            path: path.to_string(),
            reason,
        })
    }

    /// Parse a config document, trying toml first and then json5.
    pub fn from_conf_str(conf: &str) -> Result<Self, ConfigError> {
        let toml_err = match toml::from_str(conf) {
            Ok(x) => return Ok(x),
            Err(e) => e,
        };

        json5::from_str(conf).map_err(|json_err| ConfigError::Parse {
            path: String::from("<string>"),
            reason: format!("not toml ({}), not json ({})", toml_err, json_err),
        })
    }

    /// Write this document to `path`, in the format its extension selects.
    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let write_err = |reason: String| ConfigError::Write {
            path: path.to_string(),
            reason,
        };

        let conf = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?
        };

        fs::write(path, conf).map_err(|e| write_err(e.to_string()))
    }

    /// Read `path`, or persist and return [`FullConf::generated`] when it
    /// does not exist. The flag tells whether the document was generated.
    pub fn load_or_generate(path: &str) -> Result<(Self, bool), ConfigError> {
        if Path::new(path).exists() {
            return Self::from_conf_file(path).map(|conf| (conf, false));
        }

        let conf = Self::generated();
        conf.save(path)?;
        Ok((conf, true))
    }

    pub fn add_rule(&mut self, rule: RuleConf) -> &mut Self {
        self.proxy.push(rule);
        self
    }

    pub fn apply_cmd_opts(&mut self, log: LogConf, network: NetConf) -> &mut Self {
        self.log.rst_field(&log);
        self.network.rst_field(&network);
        self
    }

    /// Resolve every rule, applying the global network options.
    ///
    /// The first invalid rule aborts the whole resolution.
    pub fn resolve_rules(&self) -> Result<Vec<Rule>, ConfigError> {
        let conn_opts = self.network.build();

        self.proxy
            .iter()
            .map(|x| {
                x.resolve().map(|mut rule| {
                    rule.conn_opts = conn_opts.clone();
                    rule
                })
            })
            .collect()
    }
}
