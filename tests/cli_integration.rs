//! Integration tests for the expnotify binary
//!
//! Each test runs the built binary against a throwaway listener bound to
//! 127.0.0.1:0 and checks what arrived on the wire:
//! - One-shot start/stop/save/terminate bodies and headers
//! - Config file defaults and --endpoint override
//! - Failure exit codes for rejected, unreachable and silent listeners
//! - The stdin-driven console, including failed sends

use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

const OK_RESPONSE: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 20\r\nConnection: close\r\n\r\n\"message dispatched\"";
const ERROR_RESPONSE: &str = "HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

#[derive(Debug)]
struct CapturedRequest {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n").filter(|l| !l.is_empty());
    let request_line = lines.next().unwrap().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .map(|(_, v)| v.parse().unwrap())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed before body was complete");
        buf.extend_from_slice(&chunk[..n]);
    }

    CapturedRequest {
        request_line,
        headers,
        body: String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string(),
    }
}

/// Start a listener that answers `count` requests with `response`
fn spawn_listener(count: usize, response: &'static str) -> (String, thread::JoinHandle<Vec<CapturedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut captured = Vec::new();
        for _ in 0..count {
            let (mut stream, _) = listener.accept().unwrap();
            captured.push(read_request(&mut stream));
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        captured
    });

    (endpoint, handle)
}

/// Start a listener that reads one request and then stays silent
fn spawn_silent_listener(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request(&mut stream);
            thread::sleep(hold);
        }
    });

    endpoint
}

fn unused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    format!("http://{}", listener.local_addr().unwrap())
}

/// Command isolated from the user's config, logs and proxies
fn expnotify(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_expnotify"));
    cmd.current_dir(home)
        .env("EXPNOTIFY_DIR", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("XDG_CONFIG_HOME", home.join("xdg"))
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("EXPNOTIFY_CONFIG")
        .env_remove("RUST_LOG");
    for var in ["HTTP_PROXY", "http_proxy", "HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"] {
        cmd.env_remove(var);
    }
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    expnotify(home).args(args).output().expect("Failed to execute expnotify")
}

#[test]
fn test_start_posts_json_with_headers() {
    let home = TempDir::new().unwrap();
    let (endpoint, listener) = spawn_listener(1, OK_RESPONSE);

    let output = run(home.path(), &["--endpoint", &endpoint, "start", "-e", "00", "-s", "10"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let requests = listener.join().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].request_line.starts_with("POST / "));
    assert_eq!(requests[0].body, r#"{"type":"START","experiment_id":"00","stimulus_id":"10"}"#);
    assert_eq!(requests[0].header("accept"), Some("application/json"));
    assert_eq!(requests[0].header("content-type"), Some("application/json"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("START"));
}

#[test]
fn test_terminate_posts_type_only() {
    let home = TempDir::new().unwrap();
    let (endpoint, listener) = spawn_listener(1, OK_RESPONSE);

    let output = run(home.path(), &["terminate", "--endpoint", &endpoint]);

    assert!(output.status.success());
    let requests = listener.join().unwrap();
    assert_eq!(requests[0].body, r#"{"type":"TERMINATE"}"#);
}

#[test]
fn test_save_posts_experiment_only() {
    let home = TempDir::new().unwrap();
    let (endpoint, listener) = spawn_listener(1, OK_RESPONSE);

    let output = run(home.path(), &["--endpoint", &endpoint, "save", "-e", "study_1_p10"]);

    assert!(output.status.success());
    let requests = listener.join().unwrap();
    assert_eq!(requests[0].body, r#"{"type":"SAVE","experiment_id":"study_1_p10"}"#);
}

#[test]
fn test_ids_default_from_config_file() {
    let home = TempDir::new().unwrap();
    let (endpoint, listener) = spawn_listener(1, OK_RESPONSE);

    let config_dir = home.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("expnotify.yaml"),
        format!("endpoint: {}\nexperiment_id: p01\nstimulus_id: \"3\"\n", endpoint),
    )
    .unwrap();

    let output = run(home.path(), &["stop"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let requests = listener.join().unwrap();
    assert_eq!(requests[0].body, r#"{"type":"STOP","experiment_id":"p01","stimulus_id":"3"}"#);
}

#[test]
fn test_rejected_request_exits_nonzero() {
    let home = TempDir::new().unwrap();
    let (endpoint, listener) = spawn_listener(1, ERROR_RESPONSE);

    let output = run(home.path(), &["--endpoint", &endpoint, "start"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not be sent"));
    listener.join().unwrap();
}

#[test]
fn test_unreachable_listener_exits_nonzero() {
    let home = TempDir::new().unwrap();

    let output = run(home.path(), &["--endpoint", &unused_endpoint(), "stop"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not be sent"));
}

#[test]
fn test_failure_is_logged() {
    let home = TempDir::new().unwrap();

    run(home.path(), &["--endpoint", &unused_endpoint(), "terminate"]);

    let log = fs::read_to_string(home.path().join("data/expnotify/logs/expnotify.log")).unwrap();
    assert!(log.contains("Failed to send TERMINATE"));
}

#[test]
fn test_configured_timeout_bounds_a_silent_listener() {
    let home = TempDir::new().unwrap();
    let endpoint = spawn_silent_listener(Duration::from_secs(15));

    let config_dir = home.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("expnotify.yaml"),
        format!("endpoint: {}\ntimeout_secs: 1\n", endpoint),
    )
    .unwrap();

    let started = Instant::now();
    let output = run(home.path(), &["start"]);
    let elapsed = started.elapsed();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not be sent"));
    assert!(elapsed < Duration::from_secs(10), "send took {:?}", elapsed);
}

#[test]
fn test_invalid_endpoint_is_rejected() {
    let home = TempDir::new().unwrap();

    let output = run(home.path(), &["--endpoint", "ftp://127.0.0.1:9331", "start"]);

    assert!(!output.status.success());
}

#[test]
fn test_config_get_default_endpoint() {
    let home = TempDir::new().unwrap();

    let output = run(home.path(), &["config", "get", "endpoint"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "http://127.0.0.1:9331");
}

#[test]
fn test_config_set_persists() {
    let home = TempDir::new().unwrap();

    let output = run(home.path(), &["config", "set", "stimulus_id", "42"]);
    assert!(output.status.success());

    let output = run(home.path(), &["config", "get", "stimulus_id"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "42");
}

#[test]
fn test_console_sends_presses_and_exits_on_terminate() {
    let home = TempDir::new().unwrap();
    let (endpoint, listener) = spawn_listener(2, OK_RESPONSE);

    let mut child = expnotify(home.path())
        .args(["--endpoint", &endpoint, "console", "-e", "00"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn expnotify console");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"stimulus 11\nstart\nterminate\nstart\n")
        .unwrap();

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    // Overlapping sends are unordered
    let mut bodies: Vec<String> = listener.join().unwrap().into_iter().map(|r| r.body).collect();
    bodies.sort();
    assert_eq!(
        bodies,
        vec![
            r#"{"type":"START","experiment_id":"00","stimulus_id":"11"}"#.to_string(),
            r#"{"type":"TERMINATE"}"#.to_string(),
        ]
    );
}

#[test]
fn test_console_absorbs_failures() {
    let home = TempDir::new().unwrap();

    let mut child = expnotify(home.path())
        .args(["--endpoint", &unused_endpoint(), "console"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn expnotify console");

    child.stdin.take().unwrap().write_all(b"start\nstart\nq\n").unwrap();

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("START failed").count(), 2, "stdout: {}", stdout);

    let log = fs::read_to_string(home.path().join("data/expnotify/logs/expnotify.log")).unwrap();
    assert!(log.contains("Failed to send START"));
}
