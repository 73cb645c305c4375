//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::net::TcpListener;
use std::net::TcpStream;
use std::process::Child;
use std::process::Command as StdCommand;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use assert_cmd::Command;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Address nothing listens on, for unavailable-server tests.
pub const UNREACHABLE_SERVER: &str = "http://127.0.0.1:1/";

pub fn place_command() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("place"));
    cmd.env_remove("PLACE_SERVER")
        .env_remove("PLACE_LISTEN")
        .env_remove("PORT")
        .env_remove("PLACE_LOG")
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "warn");
    cmd
}

fn free_local_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr")
}

/// A `place serve` child process bound to a free loopback port.
pub struct ServerProcess {
    child: Child,
    addr: SocketAddr,
}

impl ServerProcess {
    pub fn start() -> Self {
        let addr = free_local_addr();
        let child = StdCommand::new(assert_cmd::cargo::cargo_bin!("place"))
            .args(["serve", "--listen", &addr.to_string()])
            .env_remove("PLACE_LOG")
            .env("NO_COLOR", "1")
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn place serve");
        let server = Self { child, addr };
        server.wait_until_ready();
        server
    }

    fn wait_until_ready(&self) {
        let deadline = Instant::now() + STARTUP_TIMEOUT;
        while Instant::now() < deadline {
            if TcpStream::connect_timeout(&self.addr, Duration::from_millis(100)).is_ok() {
                return;
            }
            thread::sleep(Duration::from_millis(50));
        }
        panic!("place serve did not start listening on {}", self.addr);
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn wait_for_exit(mut self, timeout: Duration) -> Option<i32> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(Some(status)) = self.child.try_wait() {
                return status.code();
            }
            thread::sleep(Duration::from_millis(50));
        }
        None
    }

    /// Runs a client command against this server.
    pub fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        place_command()
            .args(args)
            .args(["--server", &self.url()])
            .assert()
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
