//! Operation-region IO (AUX). An operation region is an addressable window
//! into system memory, IO-port space, PCI config space, or embedded
//! controller space; reading/writing a `Field` means reading/writing
//! through the region it's declared over, via the host [`Handler`](crate::Handler).

use crate::{
    field::{FieldAccessType, FieldFlags, FieldUpdateRule},
    AmlContext, AmlError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSpace {
    SystemMemory,
    SystemIo,
    PciConfig,
    EmbeddedControl,
    SMBus,
    SystemCmos,
    PciBarTarget,
    Ipmi,
    GeneralPurposeIo,
    GenericSerialBus,
    Pcc,
}

impl RegionSpace {
    pub fn from_byte(byte: u8) -> Result<RegionSpace, AmlError> {
        Ok(match byte {
            0x00 => RegionSpace::SystemMemory,
            0x01 => RegionSpace::SystemIo,
            0x02 => RegionSpace::PciConfig,
            0x03 => RegionSpace::EmbeddedControl,
            0x04 => RegionSpace::SMBus,
            0x05 => RegionSpace::SystemCmos,
            0x06 => RegionSpace::PciBarTarget,
            0x07 => RegionSpace::Ipmi,
            0x08 => RegionSpace::GeneralPurposeIo,
            0x09 => RegionSpace::GenericSerialBus,
            0x0A => RegionSpace::Pcc,
            other => return Err(AmlError::InvalidRegionSpace(other)),
        })
    }
}

/// Read `access_size` bits (8/16/32/64) from `space` at `address`
/// (PCI config space packs segment=0, bus/device/function into the high
/// bits of `address` the way the teacher's own `Handler` trait expects -
/// field access to PCI is narrowed to segment 0/bus 0 for the core, which
/// never needs more; a full PCI OpRegion decoder is `AUX`'s job).
pub fn read(ctx: &AmlContext, space: RegionSpace, address: u64, access_size: u8) -> Result<u64, AmlError> {
    let handler = ctx.handler();
    Ok(match (space, access_size) {
        (RegionSpace::SystemMemory, 8) => handler.read_u8(address as usize) as u64,
        (RegionSpace::SystemMemory, 16) => handler.read_u16(address as usize) as u64,
        (RegionSpace::SystemMemory, 32) => handler.read_u32(address as usize) as u64,
        (RegionSpace::SystemMemory, 64) => handler.read_u64(address as usize),
        (RegionSpace::SystemIo, 8) => handler.read_io_u8(address as u16) as u64,
        (RegionSpace::SystemIo, 16) => handler.read_io_u16(address as u16) as u64,
        (RegionSpace::SystemIo, 32) => handler.read_io_u32(address as u16) as u64,
        (RegionSpace::PciConfig, 8) => handler.read_pci_u8(0, 0, 0, 0, address as u16) as u64,
        (RegionSpace::PciConfig, 16) => handler.read_pci_u16(0, 0, 0, 0, address as u16) as u64,
        (RegionSpace::PciConfig, 32) => handler.read_pci_u32(0, 0, 0, 0, address as u16) as u64,
        _ => return Err(AmlError::FieldInvalidAccessSize),
    })
}

pub fn write(ctx: &mut AmlContext, space: RegionSpace, address: u64, access_size: u8, value: u64) -> Result<(), AmlError> {
    let handler = ctx.handler_mut();
    match (space, access_size) {
        (RegionSpace::SystemMemory, 8) => handler.write_u8(address as usize, value as u8),
        (RegionSpace::SystemMemory, 16) => handler.write_u16(address as usize, value as u16),
        (RegionSpace::SystemMemory, 32) => handler.write_u32(address as usize, value as u32),
        (RegionSpace::SystemMemory, 64) => handler.write_u64(address as usize, value),
        (RegionSpace::SystemIo, 8) => handler.write_io_u8(address as u16, value as u8),
        (RegionSpace::SystemIo, 16) => handler.write_io_u16(address as u16, value as u16),
        (RegionSpace::SystemIo, 32) => handler.write_io_u32(address as u16, value as u32),
        (RegionSpace::PciConfig, 8) => handler.write_pci_u8(0, 0, 0, 0, address as u16, value as u8),
        (RegionSpace::PciConfig, 16) => handler.write_pci_u16(0, 0, 0, 0, address as u16, value as u16),
        (RegionSpace::PciConfig, 32) => handler.write_pci_u32(0, 0, 0, 0, address as u16, value as u32),
        _ => return Err(AmlError::FieldInvalidAccessSize),
    }
    Ok(())
}

pub(crate) fn access_width_bits(flags: FieldFlags) -> Result<u8, AmlError> {
    Ok(match flags.access_type()? {
        FieldAccessType::Any | FieldAccessType::Byte | FieldAccessType::Buffer => 8,
        FieldAccessType::Word => 16,
        FieldAccessType::DWord => 32,
        FieldAccessType::QWord => 64,
    })
}

/// Read a plain (non-indexed) field: `bit_length` bits starting at
/// `bit_offset` within `space`'s region, generalized from the teacher's
/// own `read_indexed_field` byte-stepping loop to a region read at a
/// direct `offset + bit_offset/8`.
pub fn read_field(
    ctx: &AmlContext,
    space: RegionSpace,
    region_offset: u64,
    bit_offset: u64,
    bit_length: u64,
    flags: FieldFlags,
) -> Result<u64, AmlError> {
    let access_width = access_width_bits(flags)? as u64;
    let byte_offset = region_offset + bit_offset / 8;

    let mut result: u64 = 0;
    let mut bits_read = 0;
    while bits_read < bit_length {
        let word = read(ctx, space, byte_offset + bits_read / 8, access_width.min(64) as u8)?;
        result |= word << bits_read;
        bits_read += access_width;
    }

    if bit_length < 64 {
        result &= (1u64 << bit_length) - 1;
    }
    Ok(result)
}

pub fn write_field(
    ctx: &mut AmlContext,
    space: RegionSpace,
    region_offset: u64,
    bit_offset: u64,
    bit_length: u64,
    flags: FieldFlags,
    value: u64,
) -> Result<(), AmlError> {
    let access_width = access_width_bits(flags)? as u64;
    let byte_offset = region_offset + bit_offset / 8;

    let preserved = match flags.field_update_rule()? {
        FieldUpdateRule::Preserve => read_field(ctx, space, region_offset, bit_offset, bit_length, flags)?,
        FieldUpdateRule::WriteAsOnes => u64::MAX,
        FieldUpdateRule::WriteAsZeros => 0,
    };

    let mask = if bit_length < 64 { (1u64 << bit_length) - 1 } else { u64::MAX };
    let merged = (preserved & !mask) | (value & mask);

    let mut bits_written = 0;
    while bits_written < bit_length {
        let word = (merged >> bits_written) & (access_width_mask(access_width));
        write(ctx, space, byte_offset + bits_written / 8, access_width.min(64) as u8, word)?;
        bits_written += access_width;
    }
    Ok(())
}

fn access_width_mask(width: u64) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}
