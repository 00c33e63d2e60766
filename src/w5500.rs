use embedded_hal::spi::SpiDevice;

use crate::bus::{Bus, FourWire};
use crate::config::{ChipSelect, StaticConfig};
use crate::interface::{LeaseStatus, NetworkInterface};
use crate::net::{Ipv4Addr, MacAddress};
use crate::register::{self, common::PhyConfig};
use crate::tcp::TcpClient;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitializeError<SpiError> {
    SpiError(SpiError),
    ChipNotConnected,
}

impl<SpiError> From<SpiError> for InitializeError<SpiError> {
    fn from(error: SpiError) -> InitializeError<SpiError> {
        InitializeError::SpiError(error)
    }
}

/// A WIZnet W5500 as a [`NetworkInterface`].
///
/// The chip runs the IP stack in hardware but has no DHCP engine, so only
/// static addressing connects; [`begin_dhcp`](NetworkInterface::begin_dhcp)
/// programs the MAC and reports that no lease was obtained.
pub struct W5500<SpiBus: Bus> {
    client: TcpClient<SpiBus>,
    dns: Ipv4Addr,
}

impl<SPI: SpiDevice> W5500<FourWire<SPI>> {
    pub fn from_spi(spi: SPI) -> Self {
        W5500::new(FourWire::new(spi))
    }
}

impl<SpiBus: Bus> W5500<SpiBus> {
    pub fn new(bus: SpiBus) -> Self {
        W5500 {
            client: TcpClient::new(bus),
            dns: Ipv4Addr::UNSPECIFIED,
        }
    }

    pub fn release(self) -> SpiBus {
        self.client.release()
    }

    fn bus(&mut self) -> &mut SpiBus {
        &mut self.client.bus
    }

    /// Checks that a W5500 answers and soft-resets it.
    pub fn try_initialize(&mut self) -> Result<(), InitializeError<SpiBus::Error>> {
        #[cfg(not(feature = "no-chip-version-assertion"))]
        self.assert_chip_version(register::common::CHIP_VERSION)?;

        self.reset()?;
        Ok(())
    }

    #[inline]
    pub fn reset(&mut self) -> Result<(), SpiBus::Error> {
        self.bus().write_frame(
            register::COMMON,
            register::common::MODE,
            &[register::common::MODE_RESET],
        )
    }

    #[inline]
    pub fn version(&mut self) -> Result<u8, SpiBus::Error> {
        let mut version_register = [0_u8];
        self.bus().read_frame(
            register::COMMON,
            register::common::VERSION,
            &mut version_register,
        )?;
        Ok(version_register[0])
    }

    pub fn phy_config(&mut self) -> Result<PhyConfig, SpiBus::Error> {
        let mut phy = [0u8];
        self.bus()
            .read_frame(register::COMMON, register::common::PHY_CONFIG, &mut phy)?;
        Ok(phy[0].into())
    }

    pub fn ip(&mut self) -> Result<Ipv4Addr, SpiBus::Error> {
        self.read_address(register::common::IP)
    }

    pub fn gateway(&mut self) -> Result<Ipv4Addr, SpiBus::Error> {
        self.read_address(register::common::GATEWAY)
    }

    pub fn subnet_mask(&mut self) -> Result<Ipv4Addr, SpiBus::Error> {
        self.read_address(register::common::SUBNET_MASK)
    }

    pub fn mac(&mut self) -> Result<MacAddress, SpiBus::Error> {
        let mut mac = MacAddress::default();
        self.bus()
            .read_frame(register::COMMON, register::common::MAC, &mut mac.octets)?;
        Ok(mac)
    }

    /// The chip has no DNS register; this is the server from the last static
    /// configuration.
    pub fn dns_server(&self) -> Ipv4Addr {
        self.dns
    }

    fn read_address(&mut self, address: u16) -> Result<Ipv4Addr, SpiBus::Error> {
        let mut octets = [0u8; 4];
        self.bus()
            .read_frame(register::COMMON, address, &mut octets)?;
        Ok(Ipv4Addr::from(octets))
    }

    fn write_settings(
        &mut self,
        mac: MacAddress,
        ip: Ipv4Addr,
        gateway: Ipv4Addr,
        subnet: Ipv4Addr,
    ) -> Result<(), SpiBus::Error> {
        let bus = self.bus();
        bus.write_frame(register::COMMON, register::common::MAC, &mac.octets)?;
        bus.write_frame(register::COMMON, register::common::GATEWAY, &gateway.octets())?;
        bus.write_frame(register::COMMON, register::common::SUBNET_MASK, &subnet.octets())?;
        bus.write_frame(register::COMMON, register::common::IP, &ip.octets())?;
        Ok(())
    }

    #[cfg(not(feature = "no-chip-version-assertion"))]
    fn assert_chip_version(
        &mut self,
        expected_version: u8,
    ) -> Result<(), InitializeError<SpiBus::Error>> {
        if self.version()? != expected_version {
            Err(InitializeError::ChipNotConnected)
        } else {
            Ok(())
        }
    }
}

impl<SpiBus: Bus> NetworkInterface for W5500<SpiBus> {
    type Client = TcpClient<SpiBus>;

    fn initialize(&mut self, chip_select: ChipSelect) {
        match self.try_initialize() {
            Ok(()) => debug!("W5500 on CS {} initialized", chip_select.0),
            Err(InitializeError::ChipNotConnected) => {
                warn!("No W5500 answering on CS {}", chip_select.0)
            }
            Err(InitializeError::SpiError(_)) => warn!("SPI error initializing W5500"),
        }
    }

    fn begin_dhcp(&mut self, mac: MacAddress) -> bool {
        let unspecified = Ipv4Addr::UNSPECIFIED;
        if self
            .write_settings(mac, unspecified, unspecified, unspecified)
            .is_err()
        {
            warn!("SPI error writing W5500 settings");
        }
        warn!("W5500 has no DHCP client, no lease obtained");
        false
    }

    fn begin_static(&mut self, mac: MacAddress, config: &StaticConfig) {
        self.dns = config.dns;
        if self
            .write_settings(mac, config.ip, config.gateway, config.subnet)
            .is_err()
        {
            warn!("SPI error writing W5500 settings");
        }
    }

    fn maintain_lease(&mut self) -> LeaseStatus {
        LeaseStatus::Nothing
    }

    fn link_is_up(&mut self) -> bool {
        match self.phy_config() {
            Ok(phy) => phy.link_up(),
            Err(_) => {
                warn!("SPI error reading W5500 PHY status");
                false
            }
        }
    }

    fn local_address(&mut self) -> Ipv4Addr {
        self.ip().unwrap_or(Ipv4Addr::UNSPECIFIED)
    }

    fn client(&mut self) -> &mut TcpClient<SpiBus> {
        &mut self.client
    }
}
