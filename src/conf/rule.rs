use serde::{Serialize, Deserialize};

use simpleproxy_core::rule::{ConnectOpts, Mode, Rule};

use super::ConfigError;

/// One entry of the `proxy` list, as written by the user.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConf {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,

    #[serde(default)]
    pub remote: Option<String>,

    #[serde(default, rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

// host:port, the host must not be empty
fn is_host_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

// host:port or :port
fn is_listen_addr(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((_, port)) => port.parse::<u16>().is_ok(),
        None => false,
    }
}

// listen on the remote port, on every interface
fn derive_local(remote: &str) -> Result<String, ConfigError> {
    let mut parts = remote.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(port), None) => Ok(format!(":{}", port)),
        _ => Err(ConfigError::InvalidLocal(remote.to_string())),
    }
}

impl RuleConf {
    pub fn new(local: Option<&str>, remote: &str, mode: Option<&str>) -> Self {
        RuleConf {
            local: local.map(String::from),
            remote: Some(String::from(remote)),
            mode: mode.map(String::from),
        }
    }

    /// Fill in the defaults of `type` and `local`.
    ///
    /// An unrecognized `type` is kept as [`Mode::Unknown`]; the engine skips
    /// such a rule instead of refusing to start.
    pub fn resolve(&self) -> Result<Rule, ConfigError> {
        let remote = match self.remote.as_deref() {
            Some(x) if !x.is_empty() => x,
            _ => return Err(ConfigError::MissingRemote),
        };

        if !is_host_port(remote) {
            return Err(ConfigError::InvalidRemote(remote.to_string()));
        }

        let local = match self.local.as_deref() {
            Some(x) if !x.is_empty() => {
                if !is_listen_addr(x) {
                    return Err(ConfigError::InvalidLocal(x.to_string()));
                }
                x.to_string()
            }
            _ => derive_local(remote)?,
        };

        let mode = Mode::from(self.mode.as_deref().unwrap_or_default());

        Ok(Rule {
            local,
            remote: remote.to_string(),
            mode,
            conn_opts: ConnectOpts::default(),
        })
    }
}
