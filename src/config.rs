use crate::net::Ipv4Addr;

/// Time between connection attempts while disconnected, in milliseconds.
pub const DEFAULT_RETRY_INTERVAL: u32 = 10_000;

/// Hardware pin used to select the Ethernet controller on a shared SPI bus.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipSelect(pub u8);

/// Addressing used by the Ethernet controller.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct StaticConfig {
    pub ip: Ipv4Addr,
    pub dns: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub subnet: Ipv4Addr,
}

impl StaticConfig {
    pub const fn new(ip: Ipv4Addr, dns: Ipv4Addr, gateway: Ipv4Addr, subnet: Ipv4Addr) -> Self {
        Self {
            ip,
            dns,
            gateway,
            subnet,
        }
    }

    /// The gateway is derived from `ip` by replacing the last octet with `.1`,
    /// the DNS server is the gateway and the subnet is a /24.
    ///
    /// ```
    /// use ethernet_manager::{Ipv4Addr, StaticConfig};
    ///
    /// let config = StaticConfig::with_defaults(Ipv4Addr::new(192, 168, 0, 201));
    /// assert_eq!(config.gateway, Ipv4Addr::new(192, 168, 0, 1));
    /// assert_eq!(config.dns, config.gateway);
    /// assert_eq!(config.subnet, Ipv4Addr::new(255, 255, 255, 0));
    /// ```
    pub fn with_defaults(ip: Ipv4Addr) -> Self {
        let mut gateway = ip.octets();
        gateway[3] = 1;
        let gateway = Ipv4Addr::from(gateway);
        Self::new(ip, gateway, gateway, Ipv4Addr::new(255, 255, 255, 0))
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StaticConfig {
    fn format(&self, fmt: defmt::Formatter) {
        let [a, b, c, d] = self.ip.octets();
        let [g0, g1, g2, g3] = self.gateway.octets();
        defmt::write!(
            fmt,
            "ip {}.{}.{}.{} gateway {}.{}.{}.{}",
            a,
            b,
            c,
            d,
            g0,
            g1,
            g2,
            g3
        )
    }
}

/// How the manager obtains an address.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    Dhcp,
    Static(StaticConfig),
}

impl AddressMode {
    pub fn is_static(&self) -> bool {
        matches!(self, AddressMode::Static(_))
    }
}

impl Default for AddressMode {
    fn default() -> Self {
        AddressMode::Dhcp
    }
}
