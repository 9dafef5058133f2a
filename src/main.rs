use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tt_capture_rs::imaging::{
    CaptureConfig, CaptureDevice, CaptureSession, DebayerMethod, DeviceContext, ImageDevice,
    OutputConfig, RawFileDriver, SyntheticDriver, TiffCompression,
};
use tt_capture_rs::logger;

use tracing::{error, info};

const USAGE: &str = "usage: tt_capture_rs [--frames N] [--out DIR] [--debayer bilinear|linear] \
                     [--compression none|lzw|deflate-fast|deflate-balanced|deflate-best] [RAW_FILE...]";

struct Args {
    frames: usize,
    out: PathBuf,
    debayer: DebayerMethod,
    compression: TiffCompression,
    inputs: Vec<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        frames: 10,
        out: PathBuf::from("frames"),
        debayer: DebayerMethod::Bilinear,
        compression: TiffCompression::None,
        inputs: Vec::new(),
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--frames" => {
                let value = iter.next().context("--frames needs a value")?;
                args.frames = value
                    .parse()
                    .with_context(|| format!("invalid frame count '{}'", value))?;
            }
            "--out" => {
                args.out = iter.next().context("--out needs a directory")?.into();
            }
            "--debayer" => {
                let value = iter.next().context("--debayer needs a method")?;
                args.debayer = value.parse()?;
            }
            "--compression" => {
                let value = iter.next().context("--compression needs a method")?;
                args.compression = value.parse()?;
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
            _ => args.inputs.push(arg.into()),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    logger::init();

    let args = parse_args()?;
    info!("Starting tt_capture_rs...");

    let mut context = DeviceContext::new();
    let capture_config = CaptureConfig::builder()
        .debayer_method(args.debayer)
        .build();

    let device: Box<dyn ImageDevice> = if args.inputs.is_empty() {
        info!("No RAW files given, using the synthetic camera");
        Box::new(CaptureDevice::new(
            SyntheticDriver::new(),
            &mut context,
            capture_config,
        ))
    } else {
        info!("Playing {} RAW files", args.inputs.len());
        Box::new(CaptureDevice::new(
            RawFileDriver::new(&args.inputs),
            &mut context,
            capture_config,
        ))
    };

    let output_config = OutputConfig::builder()
        .compression(args.compression)
        .build();
    let mut session = CaptureSession::new(device, output_config);

    info!("Debayering: {:?}", args.debayer);
    info!("Compression: {:?}", session.config().compression);

    match session.record(args.frames, &args.out) {
        Ok(timings) => {
            timings.log_summary();
            info!(
                "Wrote {} frames to {}",
                timings.frame_count(),
                args.out.display()
            );
        }
        Err(e) => {
            error!("Recording failed: {}", e);
            return Err(e).with_context(|| format!("recording into {}", args.out.display()));
        }
    }

    Ok(())
}
