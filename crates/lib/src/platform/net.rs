//! Local address discovery.

use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::debug;

/// Any routable address works; connecting a UDP socket sends nothing.
const PROBE_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(192, 0, 2, 1), 9);

/// Detect the IPv4 address of the interface carrying the default route.
pub fn detect_ip_address() -> io::Result<IpAddr> {
  let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
  socket.connect(PROBE_ADDR)?;
  let ip = socket.local_addr()?.ip();

  if ip.is_unspecified() || ip.is_loopback() {
    return Err(io::Error::new(
      io::ErrorKind::AddrNotAvailable,
      format!("no global IPv4 address found (got {})", ip),
    ));
  }

  debug!(ip = %ip, "detected local address");
  Ok(ip)
}
