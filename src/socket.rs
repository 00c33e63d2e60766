use crate::bus::Bus;
use crate::net::Ipv4Addr;
use crate::register::socketn;

/// One of the eight hardware sockets of the W5500.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Socket {
    pub index: u8,
    register: u8,
    tx_buffer: u8,
    rx_buffer: u8,
}

impl Socket {
    pub fn new(index: u8) -> Self {
        /*
         * Socket 0 is at address    0x01
         * Socket 0 TX is at address 0x02
         * Socket 0 RX is at address 0x03
         * skip                      0x04
         * Socket 1 is at address    0x05
         * ...
         */
        let block = index * 4;
        Socket {
            index,
            register: block + 1,
            tx_buffer: block + 2,
            rx_buffer: block + 3,
        }
    }

    pub fn tx_buffer(&self) -> u8 {
        self.tx_buffer
    }
    pub fn rx_buffer(&self) -> u8 {
        self.rx_buffer
    }

    pub fn set_mode<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
        mode: socketn::Protocol,
    ) -> Result<(), SpiBus::Error> {
        bus.write_frame(self.register, socketn::MODE, &[mode as u8])
    }

    /// `Err` carries the raw register value if it is not a known status.
    pub fn status<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
    ) -> Result<Result<socketn::Status, u8>, SpiBus::Error> {
        let mut data = [0u8];
        bus.read_frame(self.register, socketn::STATUS, &mut data)?;
        Ok(socketn::Status::try_from(data[0]))
    }

    pub fn command<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
        command: socketn::Command,
    ) -> Result<(), SpiBus::Error> {
        bus.write_frame(self.register, socketn::COMMAND, &[command as u8])
    }

    pub fn has_interrupt<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
        code: socketn::Interrupt,
    ) -> Result<bool, SpiBus::Error> {
        let mut data = [0u8];
        bus.read_frame(self.register, socketn::INTERRUPT, &mut data)?;
        Ok(data[0] & code as u8 != 0)
    }

    /// Interrupt flags are cleared by writing a one to them.
    pub fn reset_interrupt<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
        code: socketn::Interrupt,
    ) -> Result<(), SpiBus::Error> {
        bus.write_frame(self.register, socketn::INTERRUPT, &[code as u8])
    }

    pub fn set_interrupt_mask<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
        mask: u8,
    ) -> Result<(), SpiBus::Error> {
        bus.write_frame(self.register, socketn::INTERRUPT_MASK, &[mask])
    }

    pub fn set_source_port<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
        port: u16,
    ) -> Result<(), SpiBus::Error> {
        bus.write_frame(self.register, socketn::SOURCE_PORT, &port.to_be_bytes())
    }

    pub fn set_destination_ip<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
        ip: Ipv4Addr,
    ) -> Result<(), SpiBus::Error> {
        bus.write_frame(self.register, socketn::DESTINATION_IP, &ip.octets())
    }

    pub fn set_destination_port<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
        port: u16,
    ) -> Result<(), SpiBus::Error> {
        bus.write_frame(self.register, socketn::DESTINATION_PORT, &port.to_be_bytes())
    }

    pub fn get_tx_write_pointer<SpiBus: Bus>(&self, bus: &mut SpiBus) -> Result<u16, SpiBus::Error> {
        self.read_u16(bus, socketn::TX_DATA_WRITE_POINTER)
    }

    pub fn set_tx_write_pointer<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
        pointer: u16,
    ) -> Result<(), SpiBus::Error> {
        bus.write_frame(self.register, socketn::TX_DATA_WRITE_POINTER, &pointer.to_be_bytes())
    }

    pub fn get_rx_read_pointer<SpiBus: Bus>(&self, bus: &mut SpiBus) -> Result<u16, SpiBus::Error> {
        self.read_u16(bus, socketn::RX_DATA_READ_POINTER)
    }

    pub fn set_rx_read_pointer<SpiBus: Bus>(
        &self,
        bus: &mut SpiBus,
        pointer: u16,
    ) -> Result<(), SpiBus::Error> {
        bus.write_frame(self.register, socketn::RX_DATA_READ_POINTER, &pointer.to_be_bytes())
    }

    /// Bytes waiting in the RX buffer.
    ///
    /// The datasheet requires reading Sn_RX_RSR until two consecutive reads agree.
    pub fn get_receive_size<SpiBus: Bus>(&self, bus: &mut SpiBus) -> Result<u16, SpiBus::Error> {
        loop {
            let sample_0 = self.read_u16(bus, socketn::RECEIVED_SIZE)?;
            let sample_1 = self.read_u16(bus, socketn::RECEIVED_SIZE)?;
            if sample_0 == sample_1 {
                break Ok(sample_0);
            }
        }
    }

    /// Free space in the TX buffer, same stable-read rule as the receive size.
    pub fn get_tx_free_size<SpiBus: Bus>(&self, bus: &mut SpiBus) -> Result<u16, SpiBus::Error> {
        loop {
            let sample_0 = self.read_u16(bus, socketn::TX_FREE_SIZE)?;
            let sample_1 = self.read_u16(bus, socketn::TX_FREE_SIZE)?;
            if sample_0 == sample_1 {
                break Ok(sample_0);
            }
        }
    }

    fn read_u16<SpiBus: Bus>(&self, bus: &mut SpiBus, address: u16) -> Result<u16, SpiBus::Error> {
        let mut data = [0u8; 2];
        bus.read_frame(self.register, address, &mut data)?;
        Ok(u16::from_be_bytes(data))
    }
}
