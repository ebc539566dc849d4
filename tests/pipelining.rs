use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use httpipe::produce::*;

/// Accept one connection, wait for `requests` bodiless requests, answer with
/// `reply` and hang up. Returns the address and what the client sent.
fn serve(requests: usize, reply: &'static [u8]) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let received = read_heads(&mut stream, requests);
        stream.write_all(reply).unwrap();
        received
    });
    (format!("http://{}/", addr), handle)
}

fn read_heads(stream: &mut TcpStream, requests: usize) -> String {
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    while count_heads(&received) < requests {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }
    String::from_utf8(received).unwrap()
}

fn count_heads(data: &[u8]) -> usize {
    data.windows(4).filter(|w| w == b"\r\n\r\n").count()
}

#[test]
fn pipelined_gets_over_tcp() {
    let (url, server) = serve(
        3,
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nfirst\
HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nContent-Type: text/plain\r\n\r\n6\r\nsecond\r\n0\r\n\r\n\
HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n",
    );
    let mut conn = Connection::open(&url, HttpConfig::default()).unwrap();
    conn.get("/one").unwrap().get("/two").unwrap().get("/three").unwrap();
    assert_eq!(conn.pending(), 3);

    assert_eq!(conn.response().unwrap().request().target(), "/one");
    assert_eq!(*conn.content().unwrap(), "first");

    assert!(conn.response().unwrap().is_chunked());
    assert_eq!(*conn.content().unwrap(), "second");

    let response = conn.response().unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(response.request().target(), "/three");
    assert_eq!(conn.pending(), 0);

    let sent = server.join().unwrap();
    let host = url.trim_start_matches("http://").trim_end_matches('/');
    assert!(sent.starts_with(&format!("GET /one HTTP/1.1\r\nHost: {}\r\n", host)));
    assert_eq!(sent.matches("HTTP/1.1\r\n").count(), 3);
}

#[test]
fn http10_body_until_close() {
    let (url, server) = serve(1, b"HTTP/1.0 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\n\r\nread until the end");
    let mut conn = Connection::open(&url, HttpConfig::default()).unwrap();
    conn.get("/").unwrap();
    assert_eq!(conn.response().unwrap().framing(), Framing::UntilClose);
    assert_eq!(*conn.content().unwrap(), "read until the end");
    assert!(!conn.is_connected());
    server.join().unwrap();
}

#[test]
fn chunked_upload_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 1024];
        // request head plus the terminating chunk
        while count_heads(&received) < 2 {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        stream.write_all(b"HTTP/1.1 201 Created\r\nLocation: /things/1\r\nContent-Length: 0\r\n\r\n").unwrap();
        String::from_utf8(received).unwrap()
    });

    let mut conn = Connection::open(&format!("http://{}/", addr), HttpConfig::default()).unwrap();
    conn.post("/things", None).unwrap();
    conn.write_chunks(&["one ", "two", ""]).unwrap();
    let response = conn.response().unwrap();
    assert_eq!(response.status(), 201);
    assert_eq!(response.location(), Some("/things/1"));

    let sent = server.join().unwrap();
    assert!(sent.ends_with("Transfer-Encoding: chunked\r\n\r\n4\r\none \r\n3\r\ntwo\r\n0\r\n\r\n"));
}
