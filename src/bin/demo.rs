//! demo - end-to-end synthetic run of the sightloop detection studio

use anyhow::{anyhow, Result};
use clap::Parser;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use sightloop::{
    BBox, Mode, Prediction, RefreshTicker, StubDetector, StubLoader, Studio, StudioConfig,
    SyntheticCamera,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds for the live webcam run.
    #[arg(long, default_value_t = 3)]
    seconds: u64,
    /// Simulated inference latency in milliseconds.
    #[arg(long, default_value_t = 40)]
    latency_ms: u64,
    /// Output directory for the exported composite.
    #[arg(long, default_value = "demo_out")]
    out: String,
}

fn canned_predictions() -> Vec<Prediction> {
    vec![
        Prediction::new(BBox::new(40.0, 60.0, 220.0, 300.0), "person", 0.91),
        Prediction::new(BBox::new(320.0, 180.0, 140.0, 90.0), "dog", 0.74),
    ]
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.seconds == 0 {
        return Err(anyhow!("seconds must be >= 1"));
    }

    let out_dir = PathBuf::from(&args.out);
    fs::create_dir_all(&out_dir)?;

    let loader = StubLoader::new(
        StubDetector::new()
            .with_predictions(canned_predictions())
            .with_latency(Duration::from_millis(args.latency_ms)),
    );
    let config = StudioConfig::load()?;
    let tick = config.tick_interval;
    let mut studio = Studio::init(&loader, config).await?;

    // Single-shot pass over a synthetic photo.
    let mut png = Vec::new();
    sightloop::frame::test_pattern(640, 480, 0).write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    let record = studio
        .ingest_file("synthetic.png", "image/png", &png)
        .await?
        .ok_or_else(|| anyhow!("image ingest should produce a record"))?;
    log::info!(
        "single-shot: {} objects on '{}'",
        record.predictions.len(),
        record.display_name
    );

    // Timed live run against the synthetic camera.
    let camera = SyntheticCamera::new();
    studio.select_mode(Mode::Webcam, &camera).await?;
    let controller = studio.controller();
    let stopper = async {
        tokio::time::sleep(Duration::from_secs(args.seconds)).await;
        controller.stop();
    };
    let mut ticker = RefreshTicker::new(tick);
    let (run, ()) = tokio::join!(studio.run_live(&mut ticker), stopper);
    run?;

    let stats = studio.controller().stats();
    log::info!(
        "live run done: {} frames, {} fps in the last window",
        stats.frames_processed,
        stats.fps
    );

    let blob = studio.export()?;
    let path = out_dir.join(&blob.file_name);
    fs::write(&path, &blob.bytes)?;
    println!(
        "exported {} ({} bytes), processed {} frames at {} fps",
        path.display(),
        blob.bytes.len(),
        stats.frames_processed,
        stats.fps
    );

    studio.teardown();
    Ok(())
}
