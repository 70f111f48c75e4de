//! Integration tests: client failure modes that never reach a greeting.

use std::time::{Duration, Instant};

use greeter_client_core::{ClientEndpoint, ClientError};
use greeter_proto::error::status;
use greeter_proto::testing::TestPki;
use greeter_proto::tls::build_client_tls_config;
use greeter_proto::load_credentials;
use tokio::net::TcpListener;

fn client(timeout: Duration) -> (ClientEndpoint, greeter_proto::testing::PkiDir) {
    let pki = TestPki::generate();
    let dir = pki.write_to_tempdir();
    let creds = load_credentials(&dir.client_paths()).expect("client credentials");
    let policy = build_client_tls_config(&creds, "server", 32).expect("client policy");
    (ClientEndpoint::new(policy).with_call_timeout(timeout), dir)
}

#[tokio::test]
async fn silent_server_hits_deadline() {
    // Accepts TCP connections but never answers the TLS handshake.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let holder = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });

    let (client, _dir) = client(Duration::from_millis(200));
    let started = Instant::now();
    let err = client.say_hello(&addr, "world").await.unwrap_err();

    assert!(matches!(err, ClientError::DeadlineExceeded(_)), "got {err:?}");
    assert_eq!(err.code(), status::DEADLINE_EXCEEDED);
    assert!(started.elapsed() < Duration::from_secs(5));
    holder.abort();
}

#[tokio::test]
async fn default_deadline_is_one_second() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let holder = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });

    let pki = TestPki::generate();
    let dir = pki.write_to_tempdir();
    let creds = load_credentials(&dir.client_paths()).unwrap();
    let client = ClientEndpoint::new(build_client_tls_config(&creds, "server", 32).unwrap());

    let err = client.say_hello(&addr, "world").await.unwrap_err();
    match err {
        ClientError::DeadlineExceeded(d) => assert_eq!(d, Duration::from_secs(1)),
        other => panic!("expected deadline, got {other:?}"),
    }
    holder.abort();
}

#[tokio::test]
async fn refused_connection_is_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let (client, _dir) = client(Duration::from_secs(1));
    let err = client.say_hello(&addr, "world").await.unwrap_err();
    assert!(matches!(err, ClientError::Connect { .. }), "got {err:?}");
}
