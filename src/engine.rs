//! Engine supervisor.
//!
//! Starts the listener loops of every rule, keeps track of them, and stops
//! them all with a single shutdown signal.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::io;

use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use simpleproxy_core::rule::{Mode, Rule};
use simpleproxy_core::tcp::run_tcp;
use simpleproxy_core::udp::run_udp;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("all {0} listeners failed")]
    AllListenersFailed(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Protocol {
    Tcp,
    Udp,
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

type Exit = (Protocol, String, io::Result<()>);

pub struct Engine {
    workers: JoinSet<Exit>,
    shutdown: CancellationToken,
    started: usize,
}

impl Engine {
    /// Spawn one listener loop per protocol of each rule.
    ///
    /// Rules of an unknown type are reported and skipped. Must be called
    /// within a tokio runtime.
    pub fn start(rules: Vec<Rule>) -> Self {
        let shutdown = CancellationToken::new();
        let mut workers = JoinSet::new();

        for rule in rules {
            if let Mode::Unknown(ty) = &rule.mode {
                log::warn!("[engine]unknown proxy type: {}, skip {}", ty, &rule);
                continue;
            }

            log::info!("[engine]inited: {}", &rule);
            let info = format!("{} -> {}", &rule.local, &rule.remote);

            if rule.mode.use_udp() {
                let (rule, shutdown, info) = (rule.clone(), shutdown.clone(), info.clone());
                workers.spawn(async move { (Protocol::Udp, info, run_udp(rule, shutdown).await) });
            }

            if rule.mode.use_tcp() {
                let shutdown = shutdown.clone();
                workers.spawn(async move { (Protocol::Tcp, info, run_tcp(rule, shutdown).await) });
            }
        }

        let started = workers.len();

        Self {
            workers,
            shutdown,
            started,
        }
    }

    /// Number of listener loops that were started.
    #[inline]
    pub const fn started(&self) -> usize {
        self.started
    }

    /// Serve until `signal` resolves, then cancel every listener loop and wait
    /// for all of them to return.
    ///
    /// A loop that fails (bind or resolve error) only takes down its own rule.
    /// Returns early with [`EngineError::AllListenersFailed`] when nothing is
    /// left running.
    pub async fn run_until<F>(mut self, signal: F) -> Result<(), EngineError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);

        let mut failed = 0;

        loop {
            tokio::select! {
                _ = &mut signal => break,
                Some(res) = self.workers.join_next() => {
                    if !report(res) {
                        failed += 1;
                    }
                    if self.workers.is_empty() && failed == self.started {
                        return Err(EngineError::AllListenersFailed(failed));
                    }
                }
            }
        }

        log::info!("[engine]shutting down {} listeners", self.workers.len());
        self.shutdown.cancel();

        while let Some(res) = self.workers.join_next().await {
            report(res);
        }

        log::info!("[engine]stopped");
        Ok(())
    }
}

// true if the loop returned normally
fn report(res: Result<Exit, JoinError>) -> bool {
    match res {
        Ok((proto, info, Ok(()))) => {
            log::info!("[{}]{} stopped", proto, info);
            true
        }
        Ok((proto, info, Err(e))) => {
            log::error!("[{}]{} failed: {}", proto, info, e);
            false
        }
        Err(e) => {
            log::error!("[engine]listener task aborted: {}", e);
            false
        }
    }
}
