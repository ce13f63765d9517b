use std::{fs, path::PathBuf};

use mboot::{HidTransport, McuBoot};

use crate::{CliError, progress::progress_bar};

pub(crate) fn enroll(client: &mut McuBoot<HidTransport>) -> Result<(), CliError> {
    client.key_prov_enroll()?;
    println!("Enrolled PUF");
    Ok(())
}

pub(crate) fn set_user_key(
    client: &mut McuBoot<HidTransport>,
    key_type: u32,
    key_hex: &str,
) -> Result<(), CliError> {
    let key = hex::decode(key_hex)?;
    client.key_prov_set_user_key(key_type, &key, None)?;
    println!("Wrote {} byte key of type {}", key.len(), key_type);
    Ok(())
}

pub(crate) fn generate_key(
    client: &mut McuBoot<HidTransport>,
    key_type: u32,
    key_size: u32,
) -> Result<(), CliError> {
    client.key_prov_set_intrinsic_key(key_type, key_size)?;
    println!("Generated key of type {}", key_type);
    Ok(())
}

pub(crate) fn write_nonvolatile(
    client: &mut McuBoot<HidTransport>,
    mem_id: u32,
) -> Result<(), CliError> {
    client.key_prov_write_nonvolatile(mem_id)?;
    println!("Wrote keystore");
    Ok(())
}

pub(crate) fn read_key_store(
    client: &mut McuBoot<HidTransport>,
    file: &PathBuf,
) -> Result<(), CliError> {
    let data = client.key_prov_read_key_store(None)?;
    fs::write(file, &data)?;
    println!("Read keystore to {}", file.display());
    Ok(())
}

pub(crate) fn receive_sb_file(
    client: &mut McuBoot<HidTransport>,
    file: &PathBuf,
) -> Result<(), CliError> {
    let data = fs::read(file)?;
    let mut bar = progress_bar("Sending");
    client.receive_sb_file(&data, Some(&mut bar))?;
    println!();
    println!("{} bytes of SB file sent.", data.len());
    Ok(())
}
