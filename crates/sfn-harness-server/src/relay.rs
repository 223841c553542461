//! Serve mode selection and the TCP relay.
//!
//! When another process already owns the primary port (typically a real
//! Step Functions Local), the harness does not compete for it. It listens
//! on the fallback port instead and pipes every connection, byte for byte,
//! to the primary port's owner.

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::{Result, ServerError};

/// How the harness serves, decided once at startup.
#[derive(Debug)]
pub enum ServeMode {
    /// The facade owns the primary port.
    Direct(TcpListener),
    /// The primary port is taken; relay from the fallback port to it.
    Relay(Relay),
}

impl ServeMode {
    /// Bind `primary`, or fall back to relaying from `fallback`.
    ///
    /// Only `AddrInUse` on the primary triggers the relay. Failing to bind
    /// the fallback is an error.
    pub async fn select(primary: SocketAddr, fallback: SocketAddr) -> Result<Self> {
        match TcpListener::bind(primary).await {
            Ok(listener) => Ok(ServeMode::Direct(listener)),
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                info!(%primary, %fallback, "Primary port in use, switching to relay mode");
                let listener = TcpListener::bind(fallback)
                    .await
                    .map_err(|source| ServerError::Bind {
                        addr: fallback,
                        source,
                    })?;
                Ok(ServeMode::Relay(Relay::new(listener, upstream_for(primary))))
            }
            Err(source) => Err(ServerError::Bind {
                addr: primary,
                source,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServeMode::Direct(_) => "direct",
            ServeMode::Relay(_) => "relay",
        }
    }

    /// Address actually listened on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let listener = match self {
            ServeMode::Direct(listener) => listener,
            ServeMode::Relay(relay) => &relay.listener,
        };
        listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read local address: {}", e)))
    }
}

/// Wildcard binds are reached through loopback.
fn upstream_for(primary: SocketAddr) -> SocketAddr {
    match primary.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), primary.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), primary.port())
        }
        _ => primary,
    }
}

/// Verbatim TCP relay.
#[derive(Debug)]
pub struct Relay {
    listener: TcpListener,
    upstream: SocketAddr,
}

impl Relay {
    pub fn new(listener: TcpListener, upstream: SocketAddr) -> Self {
        Self { listener, upstream }
    }

    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }

    /// Accept connections forever, one relay task per connection.
    pub async fn run(self) -> Result<()> {
        info!(upstream = %self.upstream, "Relay accepting connections");
        loop {
            let (inbound, peer) = self
                .listener
                .accept()
                .await
                .map_err(|e| ServerError::Internal(format!("Accept failed: {}", e)))?;
            let upstream = self.upstream;
            tokio::spawn(async move {
                if let Err(e) = pipe(inbound, upstream).await {
                    warn!(%peer, %upstream, error = %e, "Relay connection failed");
                }
            });
        }
    }
}

async fn pipe(mut inbound: TcpStream, upstream: SocketAddr) -> std::io::Result<()> {
    let mut outbound = TcpStream::connect(upstream).await?;
    let (sent, received) = tokio::io::copy_bidirectional(&mut inbound, &mut outbound).await?;
    debug!(%upstream, sent, received, "Relay connection closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_wildcard_upstream_uses_loopback() {
        let up = upstream_for("0.0.0.0:8083".parse().unwrap());
        assert_eq!(up, "127.0.0.1:8083".parse().unwrap());
        let explicit: SocketAddr = "10.0.0.5:8083".parse().unwrap();
        assert_eq!(upstream_for(explicit), explicit);
    }

    #[tokio::test]
    async fn test_free_primary_is_direct() {
        let mode = ServeMode::select(
            "127.0.0.1:0".parse().unwrap(),
            "127.0.0.1:0".parse().unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(mode.name(), "direct");
    }

    #[tokio::test]
    async fn test_taken_primary_relays_bytes() {
        // An echo server owns the primary port.
        let owner = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let primary = owner.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = owner.accept().await.unwrap();
            let mut buf = [0u8; 5];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(&buf).await.unwrap();
        });

        let mode = ServeMode::select(primary, "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(mode.name(), "relay");
        let relay_addr = mode.local_addr().unwrap();
        let ServeMode::Relay(relay) = mode else {
            panic!("expected relay mode");
        };
        assert_eq!(relay.upstream(), primary);
        tokio::spawn(relay.run());

        let mut client = TcpStream::connect(relay_addr).await.unwrap();
        client.write_all(b"hello").await.unwrap();
        let mut echoed = [0u8; 5];
        client.read_exact(&mut echoed).await.unwrap();
        assert_eq!(&echoed, b"hello");
    }

    #[tokio::test]
    async fn test_fallback_bind_failure_is_error() {
        let owner = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken = owner.local_addr().unwrap();
        let err = ServeMode::select(taken, taken).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
