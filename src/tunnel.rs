use std::process::Command;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::TunnelError;

/// An anonymizing network tunnel the crawl runs behind. Calls may block.
pub trait Tunnel: Send {
    fn connect(&mut self) -> Result<(), TunnelError>;
    fn disconnect(&mut self) -> Result<(), TunnelError>;
    fn is_connected(&self) -> bool;
}

impl<T: Tunnel + ?Sized> Tunnel for Box<T> {
    fn connect(&mut self) -> Result<(), TunnelError> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<(), TunnelError> {
        (**self).disconnect()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

/// Drives the `expressvpn` command line client.
pub struct ExpressVpn {
    location: String,
}

impl ExpressVpn {
    const BIN: &'static str = "expressvpn";

    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    fn run(args: &[&str]) -> Result<String, TunnelError> {
        let command = format!("{} {}", Self::BIN, args.join(" "));
        let output = Command::new(Self::BIN)
            .args(args)
            .output()
            .map_err(|source| TunnelError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(TunnelError::Command {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Tunnel for ExpressVpn {
    fn connect(&mut self) -> Result<(), TunnelError> {
        Self::run(&["connect", self.location.as_str()]).map(|_| ())
    }

    fn disconnect(&mut self) -> Result<(), TunnelError> {
        Self::run(&["disconnect"]).map(|_| ())
    }

    fn is_connected(&self) -> bool {
        Self::run(&["status"])
            .map(|out| out.contains("Connected to"))
            .unwrap_or(false)
    }
}

/// Used when the tunnel is switched off: the crawl goes out on the host network.
#[derive(Debug, Default)]
pub struct Direct;

impl Tunnel for Direct {
    fn connect(&mut self) -> Result<(), TunnelError> {
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), TunnelError> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// A connected tunnel, disconnected when the session is dropped.
pub struct TunnelSession<T: Tunnel> {
    tunnel: T,
}

impl<T: Tunnel + 'static> TunnelSession<T> {
    /// Connect and wait `settle` for routes to come up.
    pub async fn open(tunnel: T, settle: Duration) -> Result<Self, TunnelError> {
        let (tunnel, connected) = on_blocking_pool(tunnel, |t| t.connect()).await?;
        connected?;
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        let (tunnel, up) = on_blocking_pool(tunnel, |t| t.is_connected()).await?;
        if up {
            info!("Tunnel connected");
        } else {
            warn!("Tunnel does not report a connection; continuing");
        }
        Ok(Self { tunnel })
    }
}

impl<T: Tunnel> TunnelSession<T> {
    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.tunnel.is_connected()
    }
}

/// Run a tunnel call on tokio's blocking pool and hand the tunnel back.
async fn on_blocking_pool<T, R, F>(mut tunnel: T, call: F) -> Result<(T, R), TunnelError>
where
    T: Tunnel + 'static,
    R: Send + 'static,
    F: FnOnce(&mut T) -> R + Send + 'static,
{
    let joined = tokio::task::spawn_blocking(move || {
        let result = call(&mut tunnel);
        (tunnel, result)
    })
    .await?;
    Ok(joined)
}

impl<T: Tunnel> Drop for TunnelSession<T> {
    fn drop(&mut self) {
        if !self.tunnel.is_connected() {
            return;
        }
        match self.tunnel.disconnect() {
            Ok(()) if self.tunnel.is_connected() => warn!("Tunnel still connected after disconnect"),
            Ok(()) => info!("Tunnel disconnected"),
            Err(e) => warn!("Tunnel disconnect failed: {}", e),
        }
    }
}
