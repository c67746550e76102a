use std::fmt::{Formatter, Display};
use serde::{Serialize, Deserialize};

use simpleproxy_core::rule::{ConnectOpts, CONNECT_TIMEOUT, UDP_TIMEOUT};

use super::Config;

#[derive(Serialize, Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetConf {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<usize>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udp_timeout: Option<usize>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_delay: Option<bool>,
}

impl Config for NetConf {
    type Output = ConnectOpts;

    fn is_empty(&self) -> bool {
        empty!(self => connect_timeout, udp_timeout, no_delay)
    }

    fn build(self) -> Self::Output {
        let NetConf {
            connect_timeout,
            udp_timeout,
            no_delay,
        } = self;

        ConnectOpts {
            connect_timeout: connect_timeout.unwrap_or(CONNECT_TIMEOUT),
            udp_timeout: udp_timeout.unwrap_or(UDP_TIMEOUT),
            no_delay: no_delay.unwrap_or(true),
        }
    }

    fn rst_field(&mut self, other: &Self) -> &mut Self {
        rst!(self, connect_timeout, other);
        rst!(self, udp_timeout, other);
        rst!(self, no_delay, other);
        self
    }

    fn from_cmd_args(matches: &clap::ArgMatches) -> Self {
        macro_rules! seconds {
            ($key: expr) => {
                matches.get_one::<u64>($key).map(|x| *x as usize)
            };
        }

        Self {
            connect_timeout: seconds!("connect_timeout"),
            udp_timeout: seconds!("udp_timeout"),
            no_delay: None,
        }
    }
}

impl Display for NetConf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.build())
    }
}
