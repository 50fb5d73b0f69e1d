use std::f32::consts::PI;

use anyhow::{Context, Result};
use tracing::{error, info};

use wavexplorer::{Buffer, EngineConfig, Leveler, ProcessorChain, plugin};

const SOURCE_RATE: u32 = 44100;
const DEST_RATE: u32 = 22050;
const TONE_HZ: f32 = 440.0;

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run() {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path)?,
        None => EngineConfig::default(),
    };
    info!("Starting with {:?}", config);

    plugin::initialize(&config).context("Failed to initialize plugins")?;

    let mut buffer = Buffer::<i16>::with_shape(2, (SOURCE_RATE / 10) as usize);
    for (i, frame) in buffer.iter_frames_mut().enumerate() {
        let value = (2.0 * PI * TONE_HZ * i as f32 / SOURCE_RATE as f32).sin() * 0.8;
        frame.fill((value * f32::from(i16::MAX)) as i16);
    }
    info!(
        "Generated {} frames x {} channels at {} Hz",
        buffer.frames(),
        buffer.channels(),
        SOURCE_RATE
    );

    let mut chain = ProcessorChain::new().with(Leveler::from_config(&config));
    chain.process(&mut buffer).context("Processing failed")?;

    let resampled = buffer
        .resample(DEST_RATE, SOURCE_RATE, config.resample_quality)
        .context("Resampling failed")?;
    info!(
        "Resampled to {} frames at {} Hz ({:?})",
        resampled.frames(),
        DEST_RATE,
        config.resample_quality
    );

    let mut packed = vec![0u8; resampled.size() * 3];
    resampled
        .native_int24(&mut packed)
        .context("24-bit packing failed")?;
    info!("Packed {} bytes of 24-bit PCM", packed.len());

    plugin::shutdown().context("Failed to shut down plugins")?;
    Ok(())
}
