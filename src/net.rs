//! Networking data types.
//!
//! IPv4 addresses are `embedded-nal`'s own types so they pass straight into
//! `TcpClientStack`; only the hardware address needs a type of its own.
#![deny(unsafe_code, missing_docs)]

pub use embedded_nal::Ipv4Addr;

/// EUI-48 hardware address of the Ethernet interface.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacAddress {
    /// Octets of the MAC address.
    pub octets: [u8; 6],
}

impl MacAddress {
    /// Creates a MAC address `a:b:c:d:e:f`.
    ///
    /// Boards without a factory address usually pick a locally administered
    /// one, i.e. the second-least-significant bit of the first octet set
    /// (`x2`, `x6`, `xA`, `xE`).
    ///
    /// # Examples
    ///
    /// ```
    /// use ethernet_manager::MacAddress;
    ///
    /// let mac = MacAddress::new(0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED);
    /// assert_eq!(mac.octets(), [0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED]);
    /// ```
    #[allow(clippy::many_single_char_names)]
    pub const fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> MacAddress {
        MacAddress {
            octets: [a, b, c, d, e, f],
        }
    }

    /// Returns the six octets of this address.
    pub const fn octets(&self) -> [u8; 6] {
        self.octets
    }

    /// Whether the locally administered bit is set.
    pub const fn is_local(&self) -> bool {
        self.octets[0] & 0b10 != 0
    }

    /// 00:00:00:00:00:00
    pub const UNSPECIFIED: Self = MacAddress::new(0, 0, 0, 0, 0, 0);
}

impl From<[u8; 6]> for MacAddress {
    fn from(octets: [u8; 6]) -> MacAddress {
        MacAddress { octets }
    }
}

impl ::core::fmt::Display for MacAddress {
    fn fmt(&self, fmt: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        let [a, b, c, d, e, f] = self.octets;
        write!(
            fmt,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, f
        )
    }
}
