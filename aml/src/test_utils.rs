//! A fake [`Handler`] for unit and integration tests: system memory is a
//! plain byte vector, IO ports and PCI config space are zeroed scratch
//! arrays, and `sleep`/`stall` are no-ops. Mirrors the teacher crate's own
//! `test_utils` module - every test in this crate builds its `AmlContext`
//! from here rather than hand-rolling a `Handler` per test.

use crate::Handler;
use alloc::{vec, vec::Vec};

pub struct TestHandler {
    memory: Vec<u8>,
}

impl TestHandler {
    pub fn new() -> TestHandler {
        TestHandler { memory: vec![0; 4096] }
    }
}

impl Default for TestHandler {
    fn default() -> TestHandler {
        TestHandler::new()
    }
}

impl Handler for TestHandler {
    fn read_u8(&self, address: usize) -> u8 {
        self.memory.get(address).copied().unwrap_or(0)
    }
    fn read_u16(&self, address: usize) -> u16 {
        u16::from_le_bytes([self.read_u8(address), self.read_u8(address + 1)])
    }
    fn read_u32(&self, address: usize) -> u32 {
        u32::from_le_bytes([
            self.read_u8(address),
            self.read_u8(address + 1),
            self.read_u8(address + 2),
            self.read_u8(address + 3),
        ])
    }
    fn read_u64(&self, address: usize) -> u64 {
        (self.read_u32(address) as u64) | ((self.read_u32(address + 4) as u64) << 32)
    }

    fn write_u8(&mut self, address: usize, value: u8) {
        if address >= self.memory.len() {
            self.memory.resize(address + 1, 0);
        }
        self.memory[address] = value;
    }
    fn write_u16(&mut self, address: usize, value: u16) {
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            self.write_u8(address + i, *byte);
        }
    }
    fn write_u32(&mut self, address: usize, value: u32) {
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            self.write_u8(address + i, *byte);
        }
    }
    fn write_u64(&mut self, address: usize, value: u64) {
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            self.write_u8(address + i, *byte);
        }
    }

    fn read_io_u8(&self, _port: u16) -> u8 {
        0
    }
    fn read_io_u16(&self, _port: u16) -> u16 {
        0
    }
    fn read_io_u32(&self, _port: u16) -> u32 {
        0
    }
    fn write_io_u8(&self, _port: u16, _value: u8) {}
    fn write_io_u16(&self, _port: u16, _value: u16) {}
    fn write_io_u32(&self, _port: u16, _value: u32) {}

    fn read_pci_u8(&self, _segment: u16, _bus: u8, _device: u8, _function: u8, _offset: u16) -> u8 {
        0
    }
    fn read_pci_u16(&self, _segment: u16, _bus: u8, _device: u8, _function: u8, _offset: u16) -> u16 {
        0
    }
    fn read_pci_u32(&self, _segment: u16, _bus: u8, _device: u8, _function: u8, _offset: u16) -> u32 {
        0
    }
    fn write_pci_u8(&self, _segment: u16, _bus: u8, _device: u8, _function: u8, _offset: u16, _value: u8) {}
    fn write_pci_u16(&self, _segment: u16, _bus: u8, _device: u8, _function: u8, _offset: u16, _value: u16) {}
    fn write_pci_u32(&self, _segment: u16, _bus: u8, _device: u8, _function: u8, _offset: u16, _value: u32) {}

    fn stall(&self, _microseconds: u64) {}
    fn sleep(&self, _milliseconds: u64) {}
}
