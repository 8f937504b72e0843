//! Network reachability probes.
//!
//! # Invariants
//! - `is_online` is synchronous and sends no traffic.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};

/// Answers "is the network reachable right now".
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Asks the OS routing table whether a public address is routable.
///
/// Connecting a UDP socket performs the route lookup without sending a
/// datagram, so the check is cheap and silent.
#[derive(Debug, Clone, Copy)]
pub struct RouteProbe {
    target: SocketAddr,
}

impl RouteProbe {
    pub fn new(target: SocketAddr) -> Self {
        Self { target }
    }
}

impl Default for RouteProbe {
    fn default() -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::new(1, 1, 1, 1), 53)))
    }
}

impl ConnectivityProbe for RouteProbe {
    fn is_online(&self) -> bool {
        let bind_addr = if self.target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        let Ok(socket) = UdpSocket::bind(bind_addr) else {
            return false;
        };
        if socket.connect(self.target).is_err() {
            return false;
        }
        // A route through loopback only means no real interface is up.
        socket
            .local_addr()
            .map(|local| !local.ip().is_loopback() && !local.ip().is_unspecified())
            .unwrap_or(false)
    }
}

/// Probe with a fixed, switchable answer.
#[derive(Debug)]
pub struct StaticProbe {
    online: AtomicBool,
}

impl StaticProbe {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl ConnectivityProbe for StaticProbe {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
