use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use clap_num::maybe_hex;
use log::{LevelFilter, debug};
use parse_size::Config;

use error::CliError;
use keys::*;
use list::*;
use mboot::{HidOpener, HidTransport, McuBoot, Opener, find_hid_devices};
use read::*;
use write::*;

mod error;
mod keys;
mod list;
mod progress;
mod read;
mod write;

/// USB ids some boards re-enumerate with in bootloader mode
const FALLBACK_IDS: (u16, u16) = (0x1209, 0xb000);

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    options: Options,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
pub(crate) struct Options {
    /// vendor ID (ex: "1fc9")
    #[clap(short, long, global = true, value_parser=hex_u16, default_value = "1fc9")]
    vendor: u16,
    /// product ID (ex: "0021")
    #[clap(short, long, global = true, value_parser=hex_u16, default_value = "0021")]
    product: u16,
    /// HID report size in bytes
    #[clap(short, long, global = true, default_value_t = mboot::DEFAULT_REPORT_SIZE)]
    report_size: usize,
    /// output protocol logs
    #[clap(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// list bootloader devices
    List,
    /// list memories on device
    Mlist,
    /// read a property
    GetProperty {
        /// property name or number (ex: "UniqueDeviceId", 0x12)
        property: String,
        /// property index (ex: flash bank)
        #[clap(short, long, value_parser=maybe_hex::<u32>, default_value = "0")]
        index: u32,
    },
    /// write a property
    SetProperty {
        /// property name or number
        property: String,
        #[clap(value_parser=maybe_hex::<u32>)]
        value: u32,
    },
    /// read memory on the device
    Read {
        /// start address (ex: 0x1000)
        #[clap(value_parser=maybe_hex::<u32>)]
        address: u32,
        /// length (ex: 64K, 0x400)
        #[clap(value_parser=parse_length)]
        length: u32,
        /// write read data to output file
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// memory id
        #[clap(short, long, value_parser=maybe_hex::<u32>, default_value = "0")]
        mem_id: u32,
    },
    /// erase and write binary file to address
    Write {
        #[clap(value_parser=maybe_hex::<u32>)]
        address: u32,
        /// raw binary file
        file: PathBuf,
        /// memory id
        #[clap(short, long, value_parser=maybe_hex::<u32>, default_value = "0")]
        mem_id: u32,
    },
    /// write 32-bit words to address without erasing first
    WriteWords {
        #[clap(value_parser=maybe_hex::<u32>)]
        address: u32,
        /// words, written little-endian (ex: 0xdeadbeef 42)
        #[clap(value_parser=maybe_hex::<u32>, required = true)]
        words: Vec<u32>,
    },
    /// write hex data to address without erasing first
    RawWrite {
        #[clap(value_parser=maybe_hex::<u32>)]
        address: u32,
        /// data as hex string (ex: "deadbeef")
        data: String,
    },
    /// fill memory with a 32-bit pattern
    Fill {
        #[clap(value_parser=maybe_hex::<u32>)]
        address: u32,
        #[clap(value_parser=parse_length)]
        length: u32,
        #[clap(value_parser=maybe_hex::<u32>)]
        pattern: u32,
    },
    /// erase flash, address and length should be sector aligned
    Erase {
        #[clap(value_parser=maybe_hex::<u32>)]
        address: u32,
        #[clap(value_parser=parse_length)]
        length: u32,
        /// round length up to the flash sector size
        #[clap(short, long)]
        align: bool,
    },
    /// erase entire flash
    MassErase {
        /// memory id
        #[clap(short, long, value_parser=maybe_hex::<u32>, default_value = "0")]
        mem_id: u32,
    },
    /// perform a device soft reset
    Reset,
    /// jump to code at address
    Execute {
        #[clap(value_parser=maybe_hex::<u32>)]
        address: u32,
        #[clap(value_parser=maybe_hex::<u32>, default_value = "0")]
        argument: u32,
        /// stack pointer
        #[clap(value_parser=maybe_hex::<u32>, default_value = "0")]
        stack_pointer: u32,
    },
    /// run configure memory command
    Configure {
        #[clap(value_parser=maybe_hex::<u32>)]
        mem_id: u32,
        #[clap(value_parser=maybe_hex::<u32>)]
        address: u32,
    },
    /// write SB file to device
    ReceiveSb { file: PathBuf },
    /// enroll the PUF
    Enroll,
    /// write a known key to the device
    SetKey {
        key_type: u32,
        /// key as hex string
        key: String,
    },
    /// generate a key on the device
    GenKey { key_type: u32, key_size: u32 },
    /// write the keystore to non-volatile memory
    WriteNvm {
        #[clap(value_parser=maybe_hex::<u32>)]
        mem_id: u32,
    },
    /// read keystore to file
    ReadKeyStore { file: PathBuf },
}

fn hex_u16(s: &str) -> Result<u16, String> {
    let s = s.trim_start_matches("0x");
    <u16>::from_str_radix(s, 16).map_err(|e| format!("{e}"))
}

fn parse_length(s: &str) -> Result<u32, String> {
    let len = match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).map_err(|e| format!("{e}"))?,
        None => Config::new()
            .with_binary()
            .parse_size(s)
            .map_err(|e| format!("{e}"))?,
    };
    len.try_into().map_err(|e| format!("{e}"))
}

fn init_logger(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_module("mboot", LevelFilter::Debug);
    }
    builder.init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.options.verbose);

    if let Err(err) = run(&cli.options, &cli.command) {
        eprintln!("Error: {err}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(opts: &Options, command: &Commands) -> Result<(), CliError> {
    let mut client = match command {
        Commands::List => return list_devices(opts),
        Commands::Reset => {
            get_client(opts)?.reset()?;
            println!("Device reset.");
            return Ok(());
        }
        _ => get_client(opts)?,
    };
    let result = run_command(&mut client, command);
    client.close()?;
    result
}

fn run_command(
    client: &mut McuBoot<HidTransport>,
    command: &Commands,
) -> Result<(), CliError> {
    match command {
        Commands::List | Commands::Reset => {}
        Commands::Mlist => list_memories(client)?,
        Commands::GetProperty { property, index } => {
            get_property(client, property, *index)?
        }
        Commands::SetProperty { property, value } => {
            let prop = mboot::Property::parse(property)
                .ok_or_else(|| CliError::UnknownProperty(property.clone()))?;
            client.set_property(prop, *value)?;
            println!("{} set to {:#x}", prop.name(), value);
        }
        Commands::Read {
            address,
            length,
            output,
            mem_id,
        } => read_memory(client, *address, *length, *mem_id, output.as_ref())?,
        Commands::Write {
            address,
            file,
            mem_id,
        } => {
            let data = fs::read(file)?;
            write_memory(client, *address, &data, *mem_id, true)?
        }
        Commands::WriteWords { address, words } => {
            write_memory(client, *address, &mboot::encode_params(words), 0, false)?
        }
        Commands::RawWrite { address, data } => {
            let data = hex::decode(data)?;
            write_memory(client, *address, &data, 0, false)?
        }
        Commands::Fill {
            address,
            length,
            pattern,
        } => fill(client, *address, *length, *pattern)?,
        Commands::Erase {
            address,
            length,
            align,
        } => erase(client, *address, *length, 0, *align)?,
        Commands::MassErase { mem_id } => mass_erase(client, *mem_id)?,
        Commands::Execute {
            address,
            argument,
            stack_pointer,
        } => {
            client.execute(*address, *argument, *stack_pointer)?;
            println!("Jumped to {:#010x}", address);
        }
        Commands::Configure { mem_id, address } => {
            client.configure_memory(*mem_id, *address)?;
            println!("Configured memory {}", mem_id);
        }
        Commands::ReceiveSb { file } => receive_sb_file(client, file)?,
        Commands::Enroll => enroll(client)?,
        Commands::SetKey { key_type, key } => set_user_key(client, *key_type, key)?,
        Commands::GenKey { key_type, key_size } => {
            generate_key(client, *key_type, *key_size)?
        }
        Commands::WriteNvm { mem_id } => write_nonvolatile(client, *mem_id)?,
        Commands::ReadKeyStore { file } => read_key_store(client, file)?,
    }
    Ok(())
}

fn get_client(opts: &Options) -> Result<McuBoot<HidTransport>, CliError> {
    let mut devices = find_hid_devices(Some(opts.vendor), Some(opts.product))?;
    if devices.is_empty()
        && (opts.vendor, opts.product) == (mboot::DEFAULT_VID, mboot::DEFAULT_PID)
    {
        debug!("no device with default ids, trying {:04x}:{:04x}", FALLBACK_IDS.0, FALLBACK_IDS.1);
        devices = find_hid_devices(Some(FALLBACK_IDS.0), Some(FALLBACK_IDS.1))?;
    }

    if devices.len() > 1 {
        return Err(CliError::ManyDevices);
    }
    let device = devices.into_iter().next().ok_or(CliError::NoDevice)?;

    let mut opener = HidOpener {
        frame_size: opts.report_size,
        timeout: mboot::DEFAULT_TIMEOUT,
    };
    Ok(McuBoot::new(opener.open(&device.handle)?))
}
