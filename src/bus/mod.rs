use core::fmt::Debug;

mod four_wire;
#[cfg(test)]
mod memory;

pub use self::four_wire::FourWire;
#[cfg(test)]
pub(crate) use self::memory::MemoryBus;

/// Frame level access to the chip's register blocks.
pub trait Bus {
    type Error: Debug;

    fn read_frame(&mut self, block: u8, address: u16, data: &mut [u8]) -> Result<(), Self::Error>;

    fn write_frame(&mut self, block: u8, address: u16, data: &[u8]) -> Result<(), Self::Error>;
}
