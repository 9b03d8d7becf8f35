//! Frontend management - spawning and health checking the page under test

use std::net::TcpListener;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// How often the health endpoint is polled during startup.
const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handle to the running frontend process.
///
/// The process is addressed over loopback only and torn down when the
/// handle drops; scenarios never share a frontend with anything else.
pub struct ServerHandle {
    child: Child,
    base_url: String,
}

impl ServerHandle {
    /// Spawn the loginlab-frontend binary and wait until it serves `/health`.
    pub async fn spawn(config: ServerConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let addr = format!("127.0.0.1:{}", port);
        let base_url = format!("http://{}", addr);

        info!("Spawning frontend at {}", base_url);

        let child = Command::new(&config.binary_path)
            .env("LOGINLAB_WEB_ADDR", &addr)
            .env("RUST_LOG", "info")
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::ServerStartup(format!(
                    "failed to spawn {}: {} (build it with `cargo build -p loginlab-frontend`)",
                    config.binary_path.display(),
                    e
                ))
            })?;

        let handle = ServerHandle { child, base_url };
        handle.wait_for_healthy(config.startup_timeout).await?;

        info!("Frontend is healthy at {}", handle.base_url);
        Ok(handle)
    }

    /// Poll `/health` until it answers 200 or the startup timeout elapses.
    async fn wait_for_healthy(&self, timeout: Duration) -> E2eResult<()> {
        let health_url = format!("{}/health", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let deadline = Instant::now() + timeout;
        let mut attempts = 0usize;

        loop {
            attempts += 1;
            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => warn!("Health check returned {}", resp.status()),
                // Connection refused is expected while the process starts;
                // anything else is worth surfacing.
                Err(e) if !e.is_connect() => warn!("Health check error: {}", e),
                Err(_) if attempts == 1 => info!("Waiting for frontend to start..."),
                Err(_) => {}
            }

            if Instant::now() >= deadline {
                return Err(E2eError::ServerHealthCheck(attempts));
            }
            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }
    }

    /// Base URL scenarios run against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the frontend to exit, SIGTERM first, SIGKILL if it lingers.
    pub fn stop(&mut self) -> E2eResult<()> {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            info!("Stopping frontend (pid: {})", pid);
            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        self.child.start_kill().ok();
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning the frontend
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the loginlab-frontend binary
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for startup
    pub startup_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("../../target/debug/loginlab-frontend"),
            port: None,
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// Bind port 0 and let the OS hand out something free.
fn find_free_port() -> E2eResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_ports_are_ephemeral() {
        let port = find_free_port().unwrap();
        assert!(port > 1024);
    }

    #[test]
    fn default_config_targets_the_workspace_binary() {
        let config = ServerConfig::default();
        assert!(config
            .binary_path
            .to_string_lossy()
            .ends_with("loginlab-frontend"));
        assert!(config.port.is_none());
        assert_eq!(config.startup_timeout, Duration::from_secs(30));
    }
}
