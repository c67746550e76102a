use std::ffi::OsString;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::conf::{Config, LogConf, NetConf};
use crate::consts::{COMPAT_CONFIG_FILE, DEFAULT_CONFIG_FILE};
use crate::{ENV_CONFIG, ENV_CONFIG_COMPAT, VERSION};

/// Everything the command line can set.
#[derive(Debug, Default)]
pub struct CmdOpts {
    pub config: Option<String>,
    pub nofile: Option<u64>,
    pub log: LogConf,
    pub network: NetConf,
}

pub fn scan() -> CmdOpts {
    scan_from(std::env::args_os())
}

pub fn scan_from<I, T>(args: I) -> CmdOpts
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_app().get_matches_from(args);
    parse_matches(&matches)
}

/// Pick the config file path.
///
/// `--config` wins, then `$SIMPLEPROXY_CONFIG`, then `$GOPROXY_CONFIG`.
/// Without any of them, `simpleproxy.json` is used unless only
/// `goproxy.json` exists.
pub fn select_config<E, X>(flag: Option<String>, getenv: E, exists: X) -> String
where
    E: Fn(&str) -> Option<String>,
    X: Fn(&str) -> bool,
{
    let from_env = |key: &str| getenv(key).filter(|x| !x.is_empty());

    if let Some(path) = flag.or_else(|| from_env(ENV_CONFIG)).or_else(|| from_env(ENV_CONFIG_COMPAT)) {
        return path;
    }

    if !exists(DEFAULT_CONFIG_FILE) && exists(COMPAT_CONFIG_FILE) {
        String::from(COMPAT_CONFIG_FILE)
    } else {
        String::from(DEFAULT_CONFIG_FILE)
    }
}

fn build_app() -> Command {
    let app = Command::new("simpleproxy")
        .about("A configuration driven tcp/udp port forwarder")
        .version(VERSION)
        .disable_help_flag(true)
        .disable_version_flag(true);

    let app = add_flags(app);
    let app = add_options(app);
    add_global_options(app)
}

fn add_flags(app: Command) -> Command {
    app.next_help_heading("FLAGS").args([
        Arg::new("help")
            .short('h')
            .long("help")
            .help("show help")
            .action(ArgAction::Help)
            .display_order(0),
        Arg::new("version")
            .short('v')
            .long("version")
            .help("show version")
            .action(ArgAction::Version)
            .display_order(1),
    ])
}

fn add_options(app: Command) -> Command {
    app.next_help_heading("OPTIONS").args([
        Arg::new("config")
            .short('c')
            .long("config")
            .help("use config file, generated if missing")
            .value_name("path")
            .display_order(0),
        Arg::new("nofile")
            .short('n')
            .long("nofile")
            .help("set nofile limit")
            .value_name("limit")
            .value_parser(value_parser!(u64))
            .display_order(1),
    ])
}

fn add_global_options(app: Command) -> Command {
    let app = app.next_help_heading("LOG OPTIONS").args([
        Arg::new("log_level")
            .long("log-level")
            .help("override log level")
            .value_name("level")
            .value_parser(["off", "error", "warn", "info", "debug", "trace"])
            .display_order(0),
        Arg::new("log_output")
            .long("log-output")
            .help("override log output")
            .value_name("path")
            .display_order(1),
    ]);

    app.next_help_heading("TIMEOUT OPTIONS").args([
        Arg::new("connect_timeout")
            .long("connect-timeout")
            .help("override tcp connect timeout")
            .value_name("second")
            .value_parser(value_parser!(u64))
            .display_order(0),
        Arg::new("udp_timeout")
            .long("udp-timeout")
            .help("override udp reply timeout")
            .value_name("second")
            .value_parser(value_parser!(u64))
            .display_order(1),
    ])
}

fn parse_matches(matches: &ArgMatches) -> CmdOpts {
    CmdOpts {
        config: matches.get_one::<String>("config").cloned(),
        nofile: matches.get_one::<u64>("nofile").copied(),
        log: LogConf::from_cmd_args(matches),
        network: NetConf::from_cmd_args(matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::LogLevel;

    #[test]
    fn no_args() {
        let opts = scan_from(["simpleproxy"]);
        assert!(opts.config.is_none());
        assert!(opts.nofile.is_none());
        assert!(opts.log.is_empty());
        assert!(opts.network.is_empty());
    }

    #[test]
    fn all_args() {
        let opts = scan_from([
            "simpleproxy",
            "-c",
            "proxy.toml",
            "-n",
            "65535",
            "--log-level",
            "debug",
            "--log-output",
            "stderr",
            "--connect-timeout",
            "3",
            "--udp-timeout",
            "0",
        ]);

        assert_eq!(opts.config.as_deref(), Some("proxy.toml"));
        assert_eq!(opts.nofile, Some(65535));
        assert_eq!(opts.log.level, Some(LogLevel::Debug));
        assert_eq!(opts.log.output.as_deref(), Some("stderr"));
        assert_eq!(opts.network.connect_timeout, Some(3));
        assert_eq!(opts.network.udp_timeout, Some(0));
        assert_eq!(opts.network.no_delay, None);
    }

    #[test]
    fn config_path_precedence() {
        let env = |pairs: &'static [(&'static str, &'static str)]| {
            move |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
        };
        let none = |_: &str| false;

        let both: &[_] = &[(ENV_CONFIG, "a.json"), (ENV_CONFIG_COMPAT, "b.json")];
        assert_eq!(select_config(Some("c.toml".into()), env(both), none), "c.toml");
        assert_eq!(select_config(None, env(both), none), "a.json");

        let compat: &[_] = &[(ENV_CONFIG, ""), (ENV_CONFIG_COMPAT, "b.json")];
        assert_eq!(select_config(None, env(compat), none), "b.json");

        assert_eq!(select_config(None, env(&[]), none), DEFAULT_CONFIG_FILE);
        assert_eq!(
            select_config(None, env(&[]), |x: &str| x == COMPAT_CONFIG_FILE),
            COMPAT_CONFIG_FILE
        );
        assert_eq!(select_config(None, env(&[]), |_: &str| true), DEFAULT_CONFIG_FILE);
    }

    #[test]
    fn app_is_consistent() {
        build_app().debug_assert();
    }
}
