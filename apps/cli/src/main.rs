use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use routeb_core::echonet::constants::*;
use routeb_core::{
    Bp35a1, Frame, ModuleConfig, PanDescriptor, Property, RouteBLink, SerialTransport, StreamEnd,
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Wi-SUN Route B smart meter tool (BP35A1)", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device (overrides the config file)
    #[arg(long)]
    device: Option<String>,

    /// Baud rate (overrides the config file)
    #[arg(long)]
    baud: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the module's SKINFO line
    Info,
    /// Print the firmware version
    Version,
    /// Active scan for a PAN coordinator
    Scan {
        /// Channel mask in hex
        #[arg(long, value_parser = parse_hex_u32)]
        mask: Option<u32>,
        /// Scan duration exponent
        #[arg(long)]
        duration: Option<u8>,
    },
    /// Run the Route B bring-up and print the link
    Connect,
    /// Connect and read properties from the smart meter
    Read {
        /// EPC to request in hex, repeatable
        #[arg(long = "epc", value_parser = parse_hex_u8, default_value = "E7")]
        epcs: Vec<u8>,
        /// Number of responses to wait for
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Print received ECHONET Lite frames until Ctrl-C
    Monitor,
}

fn parse_hex_u8(s: &str) -> Result<u8, String> {
    u8::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

fn parse_hex_u32(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(args) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<ModuleConfig> {
    let mut config = match &args.config {
        Some(path) => ModuleConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ModuleConfig::default(),
    };
    if let Some(device) = &args.device {
        config.device = device.clone();
    }
    if let Some(baud) = args.baud {
        config.baud = baud;
    }
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    info!(device = %config.device, baud = config.baud, "Opening module");
    let transport =
        SerialTransport::open_with_timeout(&config.device, config.baud, config.read_timeout_ms)?;
    let mut module = Bp35a1::new(transport);

    match args.command {
        Command::Info => println!("{}", module.info()?),
        Command::Version => println!("{}", module.version()?),
        Command::Scan { mask, duration } => {
            let mask = mask.unwrap_or(config.route_b.channel_mask);
            let duration = duration.unwrap_or(config.route_b.scan_duration);
            match module.scan(mask, duration)? {
                Some(pan) => print_pan(&pan),
                None => println!("No PAN coordinator found"),
            }
        }
        Command::Connect => {
            let link = connect(&mut module, &config)?;
            print_pan(&link.pan);
            println!("Meter:        {}", link.meter_address);
        }
        Command::Read { epcs, count } => {
            let link = connect(&mut module, &config)?;
            let request = Frame::get_request(1, CONTROLLER_OBJECT, SMART_METER_OBJECT, &epcs)?;
            module.send_frame(&link.meter_address, &request, &config.route_b)?;

            let mut remaining = count;
            stream_frames(module, |frame| {
                if frame.seoj() != SMART_METER_OBJECT || frame.tid() != request.tid() {
                    return true;
                }
                if frame.esv() == ESV_GET_SNA {
                    warn!("Meter could not answer every requested property");
                }
                for property in frame.properties() {
                    println!("{}", describe_property(property));
                }
                remaining = remaining.saturating_sub(1);
                remaining > 0
            })?;
        }
        Command::Monitor => {
            stream_frames(module, |frame| {
                println!(
                    "TID {:04X} {:06X} -> {:06X} ESV {:02X}",
                    frame.tid(),
                    frame.seoj(),
                    frame.deoj(),
                    frame.esv()
                );
                for property in frame.properties() {
                    println!("  {}", describe_property(property));
                }
                true
            })?;
        }
    }

    Ok(())
}

fn connect(module: &mut Bp35a1<SerialTransport>, config: &ModuleConfig) -> Result<RouteBLink> {
    config.route_b.validate()?;
    module
        .establish(&config.route_b)
        .context("Route B bring-up failed")
}

/// Feed frames to `on_frame` until it returns false, the module goes quiet
/// for good or the user presses Ctrl-C.
fn stream_frames<F>(module: Bp35a1<SerialTransport>, mut on_frame: F) -> Result<()>
where
    F: FnMut(&Frame) -> bool,
{
    let mut stream = module.into_frame_stream()?;
    let cancel = stream.cancel_handle();
    ctrlc::set_handler(move || cancel.cancel()).context("installing Ctrl-C handler")?;

    for frame in stream.by_ref() {
        if !on_frame(&frame) {
            break;
        }
    }

    let (_module, end) = stream.finish()?;
    if let StreamEnd::Failed(reason) = end {
        bail!("frame stream failed: {}", reason);
    }
    info!(reason = %end, "Frame stream closed");
    Ok(())
}

fn print_pan(pan: &PanDescriptor) {
    println!("Channel:      {:02X}", pan.channel);
    println!("Channel page: {:02X}", pan.channel_page);
    println!("PAN ID:       {:04X}", pan.pan_id);
    println!("Address:      {}", pan.address);
    println!("LQI:          {:02X}", pan.lqi);
    println!("Pair ID:      {}", pan.pair_id);
}

fn describe_property(property: &Property) -> String {
    let edt = property.edt();
    match (property.epc(), edt.len()) {
        (EPC_INSTANTANEOUS_POWER, 4) => {
            let watts = i32::from_be_bytes([edt[0], edt[1], edt[2], edt[3]]);
            format!("Instantaneous power: {} W", watts)
        }
        (EPC_INSTANTANEOUS_CURRENT, 4) => {
            let r = i16::from_be_bytes([edt[0], edt[1]]);
            let t = i16::from_be_bytes([edt[2], edt[3]]);
            format!(
                "Instantaneous current: R {:.1} A, T {:.1} A",
                f64::from(r) / 10.0,
                f64::from(t) / 10.0
            )
        }
        (epc, _) => format!("EPC {:02X}: {}", epc, property.to_hex()),
    }
}
