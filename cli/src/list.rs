use mboot::{
    HidEnumerator, HidOpener, HidTransport, McuBoot, MemoryRegion, Property,
    enumerate,
};

use crate::{CliError, Options};

pub(crate) fn list_devices(opts: &Options) -> Result<(), CliError> {
    let devices = enumerate(
        HidEnumerator {
            vid: Some(opts.vendor),
            pid: Some(opts.product),
        },
        HidOpener {
            frame_size: opts.report_size,
            timeout: mboot::DEFAULT_TIMEOUT,
        },
    )?;
    if devices.is_empty() {
        println!("No bootloader device found");
    }
    for dev in &devices {
        println!(
            "{} ID {:04x}:{:04x} {} (serial {:?}): {}",
            dev.device.location,
            dev.handle().vendor_id(),
            dev.handle().product_id(),
            dev.device.product_name,
            dev.device.serial_number,
            dev.identity(),
        );
    }
    Ok(())
}

fn print_region(index: u32, region: &MemoryRegion) {
    let mut size = region.size();
    let size_char = if size >= 1024 && size % 1024 == 0 {
        size /= 1024;
        "K"
    } else {
        " "
    };
    print!(
        "  {}: 0x{:08X} - 0x{:08X} {:6}{} bytes",
        index,
        region.start_addr(),
        region.end_addr().saturating_sub(1),
        size,
        size_char,
    );
    match (region.sector_size(), region.sectors()) {
        (Some(sector_size), Some(sectors)) => {
            println!(" ({} sectors of {} bytes)", sectors, sector_size)
        }
        _ => println!(),
    }
}

pub(crate) fn list_memories(
    client: &mut McuBoot<HidTransport>,
) -> Result<(), CliError> {
    let memories = client.get_memories()?;
    println!("Internal flash:");
    for (index, region) in &memories.flash {
        print_region(*index, region);
    }
    println!("Internal RAM:");
    for (index, region) in &memories.ram {
        print_region(*index, region);
    }
    Ok(())
}

pub(crate) fn get_property(
    client: &mut McuBoot<HidTransport>,
    property: &str,
    index: u32,
) -> Result<(), CliError> {
    let property = Property::parse(property)
        .ok_or_else(|| CliError::UnknownProperty(property.to_string()))?;
    let values = client.get_property(property, index)?;
    if values.is_empty() {
        println!("{}: not available", property.name());
    } else {
        let values: Vec<String> =
            values.iter().map(|v| format!("{v:#010x}")).collect();
        println!("{}: {}", property.name(), values.join(" "));
    }
    Ok(())
}
