use core::convert::Infallible;
use std::collections::HashMap;
use std::vec::Vec;

use crate::bus::Bus;
use crate::register::socketn;

/// Register file of a simulated chip. Unwritten bytes read as zero and
/// socket interrupt flags are cleared by writing ones, like on the W5500.
#[derive(Debug, Default)]
pub struct MemoryBus {
    memory: HashMap<(u8, u16), u8>,
}

impl MemoryBus {
    pub fn frame(&self, block: u8, address: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|offset| self.byte(block, address.wrapping_add(offset as u16)))
            .collect()
    }

    pub fn raise_interrupt(&mut self, block: u8, bits: u8) {
        let flags = self.byte(block, socketn::INTERRUPT) | bits;
        self.memory.insert((block, socketn::INTERRUPT), flags);
    }

    fn byte(&self, block: u8, address: u16) -> u8 {
        self.memory.get(&(block, address)).copied().unwrap_or(0)
    }

    fn is_socket_register(block: u8) -> bool {
        block % 4 == 1
    }
}

impl Bus for MemoryBus {
    type Error = Infallible;

    fn read_frame(&mut self, block: u8, address: u16, data: &mut [u8]) -> Result<(), Infallible> {
        for (offset, byte) in data.iter_mut().enumerate() {
            *byte = self.byte(block, address.wrapping_add(offset as u16));
        }
        Ok(())
    }

    fn write_frame(&mut self, block: u8, address: u16, data: &[u8]) -> Result<(), Infallible> {
        if Self::is_socket_register(block) && address == socketn::INTERRUPT && data.len() == 1 {
            let flags = self.byte(block, address) & !data[0];
            self.memory.insert((block, address), flags);
            return Ok(());
        }
        for (offset, byte) in data.iter().enumerate() {
            self.memory
                .insert((block, address.wrapping_add(offset as u16)), *byte);
        }
        Ok(())
    }
}
