//! Startup banner printed once the first build is ready.

use std::net::{IpAddr, SocketAddr, UdpSocket};

use crate::log;

/// URLs the dev server answers on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeUrls {
    pub local: String,
    /// Address reachable from other machines, when the bind allows it.
    pub network: Option<String>,
}

impl ServeUrls {
    pub fn new(addr: SocketAddr) -> Self {
        Self::with_lan_ip(addr, lan_ip)
    }

    fn with_lan_ip(addr: SocketAddr, lan_ip: impl FnOnce() -> Option<IpAddr>) -> Self {
        let ip = addr.ip();
        let port = addr.port();

        if ip.is_loopback() {
            Self {
                local: format!("http://localhost:{port}"),
                network: None,
            }
        } else if ip.is_unspecified() {
            Self {
                local: format!("http://localhost:{port}"),
                network: lan_ip().map(|ip| url(ip, port)),
            }
        } else {
            Self {
                local: url(ip, port),
                network: Some(url(ip, port)),
            }
        }
    }

    pub fn print(&self) {
        log!("serve"; "ready");
        log!("serve"; "  local:   {}", self.local);
        if let Some(network) = &self.network {
            log!("serve"; "  network: {}", network);
        }
    }
}

fn url(ip: IpAddr, port: u16) -> String {
    format!("http://{}", SocketAddr::new(ip, port))
}

/// Address of the outbound interface. Connecting a UDP socket sends nothing.
fn lan_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified() && !ip.is_loopback()).then_some(ip)
}

pub fn open_browser(url: &str) {
    if let Err(e) = webbrowser::open(url) {
        log!("warn"; "failed to open {}: {}", url, e);
    }
}
