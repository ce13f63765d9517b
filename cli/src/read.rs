use std::{fs, path::PathBuf};

use mboot::{HidTransport, McuBoot};

use crate::{CliError, progress::progress_bar};

pub(crate) fn read_memory(
    client: &mut McuBoot<HidTransport>,
    address: u32,
    length: u32,
    mem_id: u32,
    output: Option<&PathBuf>,
) -> Result<(), CliError> {
    let data = match output {
        Some(_) => {
            let mut bar = progress_bar("Reading");
            let data = client.read_memory(address, length, mem_id, Some(&mut bar))?;
            println!();
            data
        }
        None => client.read_memory(address, length, mem_id, None)?,
    };

    match output {
        Some(file) => {
            fs::write(file, &data)?;
            println!("Read {} bytes.", data.len());
        }
        None => print_hex(address, &data),
    }
    Ok(())
}

fn print_hex(address: u32, data: &[u8]) {
    for (line, chunk) in data.chunks(16).enumerate() {
        let bytes: Vec<String> =
            chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!(
            "0x{:08x}: {}",
            address as usize + line * 16,
            bytes.join(" ")
        );
    }
}
