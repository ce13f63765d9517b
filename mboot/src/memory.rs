use std::collections::BTreeMap;

use log::debug;

use crate::{McuBoot, MbootError, Transport, property::Property};

/// Memory region reported by the bootloader
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MemoryRegion {
    address: u32,
    size: u32,
    sector_size: Option<u32>,
}

/// Flash and RAM regions keyed by their property index
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MemoryMap {
    pub flash: BTreeMap<u32, MemoryRegion>,
    pub ram: BTreeMap<u32, MemoryRegion>,
}

/// Properties probed for one family of indexed regions
struct PropertySeries {
    address: Property,
    size: Property,
    sector_size: Option<Property>,
}

const FLASH_SERIES: PropertySeries = PropertySeries {
    address: Property::FlashStartAddress,
    size: Property::FlashSize,
    sector_size: Some(Property::FlashSectorSize),
};

const RAM_SERIES: PropertySeries = PropertySeries {
    address: Property::RamStartAddress,
    size: Property::RamSize,
    sector_size: None,
};

impl MemoryRegion {
    pub fn new(address: u32, size: u32, sector_size: Option<u32>) -> Self {
        MemoryRegion {
            address,
            size,
            sector_size,
        }
    }

    pub fn start_addr(&self) -> u32 {
        self.address
    }
    /// Exclusive end address
    pub fn end_addr(&self) -> u64 {
        self.address as u64 + self.size as u64
    }
    pub fn size(&self) -> u32 {
        self.size
    }
    pub fn sector_size(&self) -> Option<u32> {
        self.sector_size
    }
    pub fn sectors(&self) -> Option<u32> {
        self.sector_size
            .filter(|&s| s > 0)
            .map(|s| self.size.div_ceil(s))
    }
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.address && (addr as u64) < self.end_addr()
    }
}

impl MemoryMap {
    /// Flash region holding `addr`, if any
    pub fn find_flash(&self, addr: u32) -> Option<&MemoryRegion> {
        self.flash.values().find(|r| r.contains(addr))
    }
}

impl<T: Transport> McuBoot<T> {
    /// Discover the device's flash and RAM regions by probing their
    /// indexed start address, size and sector size properties.
    pub fn get_memories(&mut self) -> Result<MemoryMap, MbootError> {
        Ok(MemoryMap {
            flash: self.probe_series(&FLASH_SERIES)?,
            ram: self.probe_series(&RAM_SERIES)?,
        })
    }

    /// Walk indexes 0, 1, 2, ... until the address property comes back
    /// empty or repeats the address of index 0, which devices use to
    /// signal the end of the list.
    fn probe_series(
        &mut self,
        series: &PropertySeries,
    ) -> Result<BTreeMap<u32, MemoryRegion>, MbootError> {
        let mut regions = BTreeMap::new();
        let mut first_address = None;

        for index in 0.. {
            let Some(&address) = self.get_property(series.address, index)?.first() else {
                break;
            };
            match first_address {
                None => first_address = Some(address),
                Some(first) if first == address => break,
                Some(_) => {}
            }

            let Some(&size) = self.get_property(series.size, index)?.first() else {
                break;
            };
            let sector_size = match series.sector_size {
                Some(property) => match self.get_property(property, index)?.first() {
                    Some(&sector_size) => Some(sector_size),
                    None => break,
                },
                None => None,
            };

            debug!(
                "{} [{}]: {:#010x}, {} bytes",
                series.address.name(),
                index,
                address,
                size
            );
            regions.insert(index, MemoryRegion::new(address, size, sector_size));
        }
        Ok(regions)
    }
}
