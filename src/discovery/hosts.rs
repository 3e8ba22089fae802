//! Hosts found by the LAN querier.

use std::net::SocketAddr;

use crate::protocol::{Advertisement, Error, Result};

/// One host that answered a discovery query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoveredHost {
    /// Sender address with the advertised netplay port substituted in.
    pub addr: SocketAddr,
    /// Host nickname.
    pub nick: String,
    /// Host frontend version.
    pub frontend_version: String,
    /// Core library name.
    pub core: String,
    /// Core library version.
    pub core_version: String,
    /// Content name, `"N/A"` when the host had none.
    pub content: String,
    /// Content checksum.
    pub content_crc: u32,
}

impl DiscoveredHost {
    pub(crate) fn from_response(sender: SocketAddr, ad: Advertisement) -> Self {
        Self {
            addr: with_advertised_port(sender, ad.port),
            nick: ad.nick,
            frontend_version: ad.frontend_version,
            core: ad.core,
            core_version: ad.core_version,
            content: ad.content,
            content_crc: ad.content_crc,
        }
    }
}

/// Replace the sender's source port with the port the host advertised.
///
/// IPv4 uses the advertised value as-is. The IPv6 conversion reproduces what
/// deployed clients do: the raw network-order word is taken in host order
/// and truncated to 16 bits, so on little-endian machines the port comes
/// out wrong (usually 0).
#[must_use]
pub fn with_advertised_port(mut sender: SocketAddr, advertised: u32) -> SocketAddr {
    let port = match sender {
        SocketAddr::V4(_) => ipv4_port(advertised),
        SocketAddr::V6(_) => ipv6_port(advertised),
    };
    sender.set_port(port);
    sender
}

#[allow(clippy::cast_possible_truncation)]
fn ipv4_port(advertised: u32) -> u16 {
    advertised as u16
}

#[allow(clippy::cast_possible_truncation)]
fn ipv6_port(advertised: u32) -> u16 {
    u32::from_ne_bytes(advertised.to_be_bytes()) as u16
}

/// Growable list of discovered hosts.
///
/// Capacity starts at 2 and doubles whenever a push would overflow it.
/// Clearing resets the logical size but keeps the allocation.
#[derive(Debug, Default, Clone)]
pub struct HostList {
    hosts: Vec<DiscoveredHost>,
    allocated: usize,
}

impl HostList {
    /// Create an empty list with nothing allocated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a host, growing the allocation if needed.
    pub fn push(&mut self, host: DiscoveredHost) -> Result<()> {
        if self.hosts.len() >= self.allocated {
            let wanted = self.allocated.checked_mul(2).unwrap_or(usize::MAX).max(2);
            self.hosts
                .try_reserve_exact(wanted - self.hosts.len())
                .map_err(|_| Error::ResourceExhausted {
                    what: "host list",
                    size: wanted,
                })?;
            self.allocated = wanted;
        }
        self.hosts.push(host);
        Ok(())
    }

    /// Forget every host.
    pub fn clear(&mut self) {
        self.hosts.clear();
    }

    /// Number of hosts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Whether no host has answered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Logical capacity of the list.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Host at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&DiscoveredHost> {
        self.hosts.get(index)
    }

    /// Iterate over the hosts in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, DiscoveredHost> {
        self.hosts.iter()
    }

    /// Borrow the hosts as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[DiscoveredHost] {
        &self.hosts
    }
}

impl<'a> IntoIterator for &'a HostList {
    type Item = &'a DiscoveredHost;
    type IntoIter = std::slice::Iter<'a, DiscoveredHost>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(n: u8) -> DiscoveredHost {
        DiscoveredHost {
            addr: SocketAddr::from(([10, 0, 0, n], 55435)),
            nick: format!("host{n}"),
            frontend_version: "1.0".into(),
            core: "core".into(),
            core_version: "2".into(),
            content: "N/A".into(),
            content_crc: u32::from(n),
        }
    }

    #[test]
    fn capacity_doubles_from_two() {
        let mut list = HostList::new();
        assert_eq!(list.allocated(), 0);

        let mut seen = Vec::new();
        for n in 0..5 {
            list.push(host(n)).unwrap();
            seen.push(list.allocated());
        }
        assert_eq!(seen, vec![2, 2, 4, 4, 8]);
        for (n, entry) in list.iter().enumerate() {
            assert_eq!(entry, &host(n as u8));
        }
    }

    #[test]
    fn clear_keeps_allocation() {
        let mut list = HostList::new();
        for n in 0..3 {
            list.push(host(n)).unwrap();
        }
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.allocated(), 4);
        list.push(host(9)).unwrap();
        assert_eq!(list.get(0), Some(&host(9)));
    }

    #[test]
    fn ipv4_uses_advertised_port() {
        let sender: SocketAddr = "192.168.1.20:40000".parse().unwrap();
        assert_eq!(
            with_advertised_port(sender, 55435),
            "192.168.1.20:55435".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    #[cfg(target_endian = "little")]
    fn ipv6_port_differs_from_ipv4_on_little_endian() {
        let v4: SocketAddr = "10.0.0.1:40000".parse().unwrap();
        let v6: SocketAddr = "[fe80::1]:40000".parse().unwrap();
        assert_eq!(with_advertised_port(v4, 55435).port(), 55435);
        // Low half of the byte-swapped word: the high (zero) bytes of the port.
        assert_eq!(with_advertised_port(v6, 55435).port(), 0);
    }

    #[test]
    #[cfg(target_endian = "big")]
    fn ipv6_port_matches_ipv4_on_big_endian() {
        let v6: SocketAddr = "[fe80::1]:40000".parse().unwrap();
        assert_eq!(with_advertised_port(v6, 55435).port(), 55435);
    }
}
