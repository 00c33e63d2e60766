#![allow(clippy::inconsistent_digit_grouping, clippy::unusual_byte_groupings)]

use byteorder::{BigEndian, ByteOrder};
use embedded_hal::spi::{ErrorType, Operation, SpiDevice};

use crate::bus::Bus;

const WRITE_MODE_MASK: u8 = 0b00000_1_00;

/// Variable data length mode over an [`SpiDevice`], which owns the chip
/// select line (MISO, MOSI, CLK and CS).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FourWire<SPI> {
    spi: SPI,
}

impl<SPI> FourWire<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

/// Address phase followed by the control phase.
fn header(block: u8, address: u16, control: u8) -> [u8; 3] {
    let mut header = [0u8; 3];
    BigEndian::write_u16(&mut header[..2], address);
    header[2] = block << 3 | control;
    header
}

impl<SPI: SpiDevice> Bus for FourWire<SPI> {
    type Error = <SPI as ErrorType>::Error;

    fn read_frame(&mut self, block: u8, address: u16, data: &mut [u8]) -> Result<(), SPI::Error> {
        let header = header(block, address, 0);
        self.spi
            .transaction(&mut [Operation::Write(&header), Operation::Read(data)])
    }

    fn write_frame(&mut self, block: u8, address: u16, data: &[u8]) -> Result<(), SPI::Error> {
        let header = header(block, address, WRITE_MODE_MASK);
        self.spi
            .transaction(&mut [Operation::Write(&header), Operation::Write(data)])
    }
}

#[cfg(test)]
mod test {
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    use crate::{
        bus::{four_wire::WRITE_MODE_MASK, Bus},
        register,
    };

    use super::FourWire;

    #[test]
    fn test_read_frame() {
        let expected_version = 4;

        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x00, 0x39, register::COMMON << 3]),
            SpiTransaction::read_vec(vec![expected_version]),
            SpiTransaction::transaction_end(),
        ];

        let mut spi = SpiMock::new(&expectations);
        let mut four_wire = FourWire::new(spi.clone());

        let mut actual_version = [0_u8; 1];
        four_wire
            .read_frame(
                register::COMMON,
                register::common::VERSION,
                &mut actual_version,
            )
            .unwrap();

        assert_eq!(expected_version, actual_version[0]);
        spi.done();
    }

    #[test]
    fn test_write_frame() {
        let socket_1_reg = 0x05_u8;
        let source_port = 49849_u16;

        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![
                0x00,
                register::socketn::SOURCE_PORT as u8,
                socket_1_reg << 3 | WRITE_MODE_MASK,
            ]),
            SpiTransaction::write_vec(source_port.to_be_bytes().to_vec()),
            SpiTransaction::transaction_end(),
        ];

        let mut spi = SpiMock::new(&expectations);
        let mut four_wire = FourWire::new(spi.clone());

        four_wire
            .write_frame(
                socket_1_reg,
                register::socketn::SOURCE_PORT,
                &source_port.to_be_bytes(),
            )
            .unwrap();

        spi.done();
    }
}
