use mboot::{HidTransport, McuBoot, Property};

use crate::{CliError, progress::progress_bar};

pub(crate) fn write_memory(
    client: &mut McuBoot<HidTransport>,
    address: u32,
    data: &[u8],
    mem_id: u32,
    erase: bool,
) -> Result<(), CliError> {
    if erase {
        println!("Erasing {} bytes at {:#010x}...", data.len(), address);
        client.flash_erase_region(address, data.len() as u32, mem_id)?;
    }

    let mut bar = progress_bar("Flashing");
    client.write_memory(address, data, mem_id, Some(&mut bar))?;
    println!();
    println!("{} bytes written.", data.len());
    Ok(())
}

/// Round `length` up to a whole number of flash sectors
fn align_to_sectors(length: u32, sector_size: u32) -> u32 {
    if sector_size == 0 {
        length
    } else {
        length.div_ceil(sector_size) * sector_size
    }
}

pub(crate) fn erase(
    client: &mut McuBoot<HidTransport>,
    address: u32,
    length: u32,
    mem_id: u32,
    align: bool,
) -> Result<(), CliError> {
    let length = if align {
        let memories = client.get_memories()?;
        let sector_size = match memories.find_flash(address) {
            Some(region) => region.sector_size(),
            None => client
                .get_property(Property::FlashSectorSize, 0)?
                .first()
                .copied(),
        };
        let aligned = align_to_sectors(length, sector_size.unwrap_or(0));
        if aligned != length {
            println!("Warning, aligning {} to {}", length, aligned);
        }
        aligned
    } else {
        length
    };

    client.flash_erase_region(address, length, mem_id)?;
    println!("{} bytes erased.", length);
    Ok(())
}

pub(crate) fn mass_erase(
    client: &mut McuBoot<HidTransport>,
    mem_id: u32,
) -> Result<(), CliError> {
    client.flash_erase_all(mem_id)?;
    println!("Flash erased.");
    Ok(())
}

pub(crate) fn fill(
    client: &mut McuBoot<HidTransport>,
    address: u32,
    length: u32,
    pattern: u32,
) -> Result<(), CliError> {
    client.fill_memory(address, length, pattern)?;
    println!("{} bytes filled with {:#010x}.", length, pattern);
    Ok(())
}
