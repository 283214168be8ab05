use std::net::{IpAddr, Ipv4Addr};

use crate::error::GatewayError;

/// First non-loopback IPv4 address among the host's interfaces, for the
/// startup banner. `None` when only loopback or IPv6 addresses are up.
///
/// Failing to list the interfaces at all is an error.
pub fn local_ipv4() -> Result<Option<Ipv4Addr>, GatewayError> {
    let interfaces = if_addrs::get_if_addrs().map_err(GatewayError::Interfaces)?;
    Ok(first_lan_ipv4(interfaces.iter().map(|iface| iface.ip())))
}

/// Picks the first IPv4 address that is not loopback, in enumeration order.
pub fn first_lan_ipv4(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|addr| match addr {
        IpAddr::V4(v4) if !v4.is_loopback() => Some(v4),
        _ => None,
    })
}
