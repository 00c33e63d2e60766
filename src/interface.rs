use derive_try_from_primitive::TryFromPrimitive;

use crate::config::{ChipSelect, StaticConfig};
use crate::net::{Ipv4Addr, MacAddress};

/// Outcome of a lease maintenance pass.
///
/// Discriminants follow the codes returned by Arduino-style Ethernet stacks,
/// so a raw code converts with `LeaseStatus::try_from(code)`.
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LeaseStatus {
    /// Nothing was due.
    Nothing = 0,
    RenewFailed = 1,
    Renewed = 2,
    RebindFailed = 3,
    Rebound = 4,
}

impl LeaseStatus {
    /// Whether the lease is gone and the address may no longer be used.
    pub fn is_failure(self) -> bool {
        matches!(self, LeaseStatus::RenewFailed | LeaseStatus::RebindFailed)
    }
}

/// The Ethernet hardware and IP stack driven by the
/// [`ConnectionManager`](crate::ConnectionManager).
///
/// None of these calls may block beyond the bounded duration of the hardware
/// operation itself. Failures are reported through the return values; the
/// manager turns them into state transitions.
pub trait NetworkInterface {
    /// Handle used by application code for TCP traffic.
    type Client;

    /// Prepares the controller selected by `chip_select` for use.
    fn initialize(&mut self, chip_select: ChipSelect);

    /// Requests a DHCP lease. Returns `true` if one was acquired.
    fn begin_dhcp(&mut self, mac: MacAddress) -> bool;

    /// Applies a fixed address configuration.
    fn begin_static(&mut self, mac: MacAddress, config: &StaticConfig);

    /// Renews or rebinds the current lease if it is due.
    fn maintain_lease(&mut self) -> LeaseStatus;

    /// Physical link status (cable plugged in and negotiated).
    fn link_is_up(&mut self) -> bool;

    /// Address currently assigned to the interface, `0.0.0.0` if none.
    fn local_address(&mut self) -> Ipv4Addr;

    fn client(&mut self) -> &mut Self::Client;
}

impl<T: NetworkInterface + ?Sized> NetworkInterface for &mut T {
    type Client = T::Client;

    fn initialize(&mut self, chip_select: ChipSelect) {
        (**self).initialize(chip_select)
    }

    fn begin_dhcp(&mut self, mac: MacAddress) -> bool {
        (**self).begin_dhcp(mac)
    }

    fn begin_static(&mut self, mac: MacAddress, config: &StaticConfig) {
        (**self).begin_static(mac, config)
    }

    fn maintain_lease(&mut self) -> LeaseStatus {
        (**self).maintain_lease()
    }

    fn link_is_up(&mut self) -> bool {
        (**self).link_is_up()
    }

    fn local_address(&mut self) -> Ipv4Addr {
        (**self).local_address()
    }

    fn client(&mut self) -> &mut Self::Client {
        (**self).client()
    }
}
