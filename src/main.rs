use std::env;
use std::fmt::Display;
use std::path::Path;
use std::process;

use simpleproxy::cmd::{self, CmdOpts};
use simpleproxy::conf::{Config, FullConf, LogConf};
use simpleproxy::engine::{Engine, EngineError};
use simpleproxy::signal::shutdown_signal;

use simpleproxy_core::rule::Rule;

fn main() {
    let CmdOpts {
        config,
        nofile,
        log,
        network,
    } = cmd::scan();

    let path = cmd::select_config(config, |key| env::var(key).ok(), |path| Path::new(path).exists());

    let (mut conf, generated) = FullConf::load_or_generate(&path).unwrap_or_else(|e| fatal(e));
    conf.apply_cmd_opts(log, network);

    setup_log(conf.log.clone());

    if generated {
        log::info!("config file {} not found, generated a default one", &path);
    }

    #[cfg(all(unix, not(target_os = "android")))]
    setup_nofile(nofile);

    #[cfg(not(all(unix, not(target_os = "android"))))]
    let _ = nofile;

    let rules = conf.resolve_rules().unwrap_or_else(|e| fatal(e));

    if let Err(e) = execute(rules) {
        fatal(e);
    }
}

fn fatal(e: impl Display) -> ! {
    eprintln!("simpleproxy: {}", e);
    process::exit(1)
}

fn setup_log(log: LogConf) {
    println!("log: {}", &log);

    let (level, output) = log
        .build()
        .unwrap_or_else(|e| fatal(format!("failed to open log output: {}", e)));

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}]{}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(output)
        .apply()
        .unwrap_or_else(|e| fatal(format!("failed to setup logger: {}", e)))
}

#[cfg(all(unix, not(target_os = "android")))]
fn setup_nofile(nofile: Option<u64>) {
    use simpleproxy_syscall::{bump_nofile_limit, get_nofile_limit, set_nofile_limit};

    let res = match nofile {
        Some(limit) => set_nofile_limit(limit),
        None => bump_nofile_limit(),
    };

    if let Err(e) = res {
        log::warn!("[sys]failed to set nofile limit: {}", e);
    }

    if let Ok((soft, hard)) = get_nofile_limit() {
        log::info!("[sys]nofile limit: soft={}, hard={}", soft, hard);
    }
}

fn execute(rules: Vec<Rule>) -> Result<(), EngineError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fatal(format!("failed to build runtime: {}", e)))
        .block_on(async { Engine::start(rules).run_until(shutdown_signal()).await })
}
