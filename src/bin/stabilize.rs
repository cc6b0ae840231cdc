use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use video_stabilizer::io::{FrameSink, FrameSource, ImageDirSink, ImageDirSource};
use video_stabilizer::{stabilize, CoreError, StabilizeOptions};

#[derive(Parser)]
#[command(version, about = "Stabilize a shaky frame sequence")]
struct Cli {
    /// directory of input frames (png/jpg, sorted by filename)
    input: PathBuf,

    /// output directory for the stabilized frames
    output: PathBuf,

    /// frame rate to record in the output metadata
    #[arg(long, default_value_t = 30)]
    fps: i32,

    /// RANSAC seed, fixed for reproducible runs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// RANSAC iterations per frame pair
    #[arg(long, default_value_t = 1000)]
    ransac_iters: usize,
}

fn main() -> Result<(), CoreError> {
    env_logger::init();
    let cli = Cli::parse();

    let (frames, metadata) = ImageDirSource::new(&cli.input, cli.fps).load()?;
    println!(
        "loaded {} frames, {}x{} @ {} fps",
        frames.len(),
        metadata.width,
        metadata.height,
        metadata.fps
    );

    let options = StabilizeOptions {
        rng_seed: cli.seed,
        ransac_iters: cli.ransac_iters,
        ..Default::default()
    };

    let now = Instant::now();
    let mut last_stage = String::new();
    let mut progress = |stage: &str, _fraction: f64| {
        if stage != last_stage {
            println!("{}...", stage);
            last_stage = stage.to_string();
        }
    };
    let result = stabilize(&frames, &metadata, &options, &mut progress, &|| false)?;
    println!(
        "stabilized in {:.2} sec, crop {}x{} at ({}, {})",
        now.elapsed().as_secs_f64(),
        result.crop.w,
        result.crop.h,
        result.crop.x,
        result.crop.y
    );
    for warning in &result.warnings {
        println!("warning: {}", warning);
    }

    ImageDirSink::new(&cli.output).write(&result.frames, &result.metadata)?;
    Ok(())
}
