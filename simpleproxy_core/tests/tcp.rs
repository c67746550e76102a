use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use simpleproxy_core::rule::{Mode, Rule};
use simpleproxy_core::tcp::TcpForwarder;

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn rule_to(remote: SocketAddr) -> Rule {
    Rule {
        local: "127.0.0.1:0".to_string(),
        remote: remote.to_string(),
        mode: Mode::Tcp,
        conn_opts: Default::default(),
    }
}

async fn start(remote: SocketAddr) -> (SocketAddr, CancellationToken, tokio::task::JoinHandle<std::io::Result<()>>) {
    let fwd = TcpForwarder::bind(&rule_to(remote)).await.unwrap();
    let laddr = fwd.local_addr();
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(fwd.serve(shutdown.clone()));
    (laddr, shutdown, handle)
}

async fn echo_server() -> SocketAddr {
    let lis = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = lis.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut stream, _) = lis.accept().await.unwrap();
            tokio::spawn(async move {
                let (mut r, mut w) = stream.split();
                let _ = tokio::io::copy(&mut r, &mut w).await;
            });
        }
    });
    addr
}

#[tokio::test]
async fn tcp() {
    init_log();
    let lis = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (laddr, _shutdown, _) = start(lis.local_addr().unwrap()).await;

    let task1 = async {
        let mut stream = TcpStream::connect(laddr).await.unwrap();

        let mut buf = vec![0; 32];

        for _ in 0..20 {
            stream.write_all(b"Ping Ping Ping").await.unwrap();
            stream.read_exact(&mut buf[..14]).await.unwrap();
            log::debug!("a got: {:?}", std::str::from_utf8(&buf[..14]).unwrap());
            assert_eq!(b"Pong Pong Pong", &buf[..14]);
        }
    };

    let task2 = async {
        let (mut stream, _) = lis.accept().await.unwrap();

        let mut buf = vec![0; 32];

        for _ in 0..20 {
            stream.read_exact(&mut buf[..14]).await.unwrap();
            log::debug!("b got: {:?}", std::str::from_utf8(&buf[..14]).unwrap());
            assert_eq!(b"Ping Ping Ping", &buf[..14]);
            stream.write_all(b"Pong Pong Pong").await.unwrap();
        }
    };

    tokio::join!(task1, task2);
}

#[tokio::test]
async fn tcp_echo_large_payload() {
    init_log();
    let (laddr, _shutdown, _) = start(echo_server().await).await;

    let stream = TcpStream::connect(laddr).await.unwrap();
    let (mut r, mut w) = stream.into_split();

    let data: Vec<u8> = (0..0x80000u32).map(|i| (i * 7 % 256) as u8).collect();
    let expect = data.clone();

    let writer = tokio::spawn(async move {
        let mut size = 1;
        let mut rest = &data[..];
        while !rest.is_empty() {
            let n = size.min(rest.len());
            w.write_all(&rest[..n]).await.unwrap();
            rest = &rest[n..];
            size = size * 3 % 8191 + 1;
        }
        w
    });

    let mut recv = vec![0u8; expect.len()];
    timeout(Duration::from_secs(10), r.read_exact(&mut recv))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recv, expect);

    drop(writer.await.unwrap());
}

#[tokio::test]
async fn tcp_close_from_client() {
    init_log();
    let lis = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (laddr, _shutdown, _) = start(lis.local_addr().unwrap()).await;

    let client = TcpStream::connect(laddr).await.unwrap();
    let (mut upstream, _) = lis.accept().await.unwrap();

    drop(client);

    let mut buf = vec![0u8; 16];
    let n = timeout(Duration::from_secs(3), upstream.read(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn tcp_close_from_upstream() {
    init_log();
    let lis = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (laddr, _shutdown, _) = start(lis.local_addr().unwrap()).await;

    let mut client = TcpStream::connect(laddr).await.unwrap();
    let (upstream, _) = lis.accept().await.unwrap();

    drop(upstream);

    let mut buf = vec![0u8; 16];
    let n = timeout(Duration::from_secs(3), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn tcp_dial_failure_closes_client() {
    init_log();
    let closed = {
        let lis = TcpListener::bind("127.0.0.1:0").await.unwrap();
        lis.local_addr().unwrap()
    };
    let (laddr, _shutdown, _) = start(closed).await;

    let mut client = TcpStream::connect(laddr).await.unwrap();

    let mut buf = vec![0u8; 16];
    let n = timeout(Duration::from_secs(3), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn tcp_shutdown_releases_listener() {
    init_log();
    let (laddr, shutdown, handle) = start(echo_server().await).await;

    shutdown.cancel();
    timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    TcpListener::bind(laddr).await.unwrap();
}

#[tokio::test]
async fn tcp_session_drains_after_shutdown() {
    init_log();
    let (laddr, shutdown, handle) = start(echo_server().await).await;

    let mut client = TcpStream::connect(laddr).await.unwrap();
    client.write_all(b"before").await.unwrap();
    let mut buf = [0u8; 6];
    client.read_exact(&mut buf).await.unwrap();

    shutdown.cancel();
    handle.await.unwrap().unwrap();

    client.write_all(b"after!").await.unwrap();
    timeout(Duration::from_secs(3), client.read_exact(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf, b"after!");
}

#[tokio::test]
async fn tcp_bind_conflict() {
    init_log();
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let mut rule = rule_to("127.0.0.1:1".parse().unwrap());
    rule.local = taken.local_addr().unwrap().to_string();

    let err = TcpForwarder::bind(&rule).await.err().unwrap();
    assert_eq!(err.kind(), std::io::ErrorKind::AddrInUse);
}

#[tokio::test]
async fn tcp_bare_port_listens_on_both_families() {
    init_log();
    // no ipv6 loopback here, nothing to check
    if std::net::TcpListener::bind("[::1]:0").is_err() {
        return;
    }

    let mut rule = rule_to(echo_server().await);
    rule.local = ":0".to_string();

    let fwd = TcpForwarder::bind(&rule).await.unwrap();
    let laddr = fwd.local_addr();
    assert!(laddr.ip().is_unspecified());

    let shutdown = CancellationToken::new();
    tokio::spawn(fwd.serve(shutdown.clone()));

    for ip in ["127.0.0.1", "::1"] {
        let addr = SocketAddr::new(ip.parse().unwrap(), laddr.port());
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"hi").await.unwrap();
        let mut buf = [0u8; 2];
        timeout(Duration::from_secs(3), client.read_exact(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf, b"hi");
    }

    shutdown.cancel();
}
