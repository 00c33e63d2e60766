#![allow(clippy::inconsistent_digit_grouping, clippy::unusual_byte_groupings)]

pub const COMMON: u8 = 0;
pub mod common {
    pub const MODE: u16 = 0x0;
    pub const GATEWAY: u16 = 0x1;
    pub const SUBNET_MASK: u16 = 0x5;
    pub const MAC: u16 = 0x9;
    pub const IP: u16 = 0xF;
    pub const PHY_CONFIG: u16 = 0x2E;
    pub const VERSION: u16 = 0x39;

    /// Writing this to MODE resets the chip.
    pub const MODE_RESET: u8 = 0b1000_0000;

    /// Value of the VERSION register on a W5500.
    pub const CHIP_VERSION: u8 = 0x04;

    /// PHYCFGR as read from the chip.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct PhyConfig(pub u8);

    impl PhyConfig {
        const LINK_UP: u8 = 1 << 0;
        const SPEED_100: u8 = 1 << 1;
        const FULL_DUPLEX: u8 = 1 << 2;

        pub fn link_up(&self) -> bool {
            self.0 & Self::LINK_UP != 0
        }

        pub fn is_100mbps(&self) -> bool {
            self.0 & Self::SPEED_100 != 0
        }

        pub fn is_full_duplex(&self) -> bool {
            self.0 & Self::FULL_DUPLEX != 0
        }
    }

    impl From<u8> for PhyConfig {
        fn from(value: u8) -> Self {
            PhyConfig(value)
        }
    }
}

pub const SOCKET0: u8 = 0b000_00001;
pub const SOCKET0_BUFFER_TX: u8 = 0b000_00010;
pub const SOCKET0_BUFFER_RX: u8 = 0b000_00011;

pub const SOCKET7: u8 = 0b000_11101;
pub const SOCKET7_BUFFER_TX: u8 = 0b000_11110;
pub const SOCKET7_BUFFER_RX: u8 = 0b000_11111;

pub mod socketn {
    use derive_try_from_primitive::TryFromPrimitive;

    pub const MODE: u16 = 0x00;
    #[repr(u8)]
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub enum Protocol {
        Closed = 0b00,
        Tcp = 0b01,
    }

    pub const COMMAND: u16 = 0x01;
    #[repr(u8)]
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub enum Command {
        Open = 0x01,
        Connect = 0x04,
        Disconnect = 0x08,
        Close = 0x10,
        Send = 0x20,
        Receive = 0x40,
    }

    pub const INTERRUPT: u16 = 0x02;
    #[repr(u8)]
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub enum Interrupt {
        All = 0b11111,
        SendOk = 0b10000,
        Timeout = 0b01000,
        Receive = 0b00100,
    }

    pub const STATUS: u16 = 0x03;
    #[repr(u8)]
    #[derive(Copy, Clone, Eq, PartialEq, Debug, TryFromPrimitive)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Status {
        Closed = 0x00,
        Init = 0x13,
        Listen = 0x14,
        SynSent = 0x15,
        SynRecv = 0x16,
        Established = 0x17,
        FinWait = 0x18,
        Closing = 0x1A,
        TimeWait = 0x1B,
        CloseWait = 0x1C,
        LastAck = 0x1D,
        Udp = 0x22,
        MacRaw = 0x42,
    }

    pub const SOURCE_PORT: u16 = 0x04;
    pub const DESTINATION_IP: u16 = 0x0C;
    pub const DESTINATION_PORT: u16 = 0x10;

    pub const INTERRUPT_MASK: u16 = 0x2C;

    pub const TX_FREE_SIZE: u16 = 0x20;
    pub const TX_DATA_WRITE_POINTER: u16 = 0x24;

    pub const RECEIVED_SIZE: u16 = 0x26;
    pub const RX_DATA_READ_POINTER: u16 = 0x28;
}
