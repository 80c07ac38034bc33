use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;
use rand::SeedableRng;

use pathtracing::config;
use pathtracing::render;
use pathtracing::{CrateRng, Screen};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = config::GLOBAL();

    let mut rng = match config.seed {
        Some(seed) => CrateRng::seed_from_u64(seed),
        None => CrateRng::from_entropy(),
    };

    // All scene construction happens up front; a bad configuration fails
    // here, before any pixel is touched.
    let (camera, world, background) = config.scene.create(config, &mut rng)?;
    info!(
        "Rendering {} at {}x{}, {} samples per pixel",
        config.scene, config.width, config.height, config.samples
    );

    let mut screen = Screen::new(config.width.get(), config.height.get());
    let rows_done = Arc::new(AtomicUsize::new(0));
    let reporter = spawn_reporter(rows_done.clone(), screen.height);

    let start = Instant::now();
    render::render(
        &mut screen,
        &camera,
        &world,
        &background,
        &config.render_opts(),
        &rows_done,
    );
    let _ = reporter.join();
    info!("Render finished in {:.2?}", start.elapsed());

    let file = File::create(&config.output)
        .with_context(|| format!("Couldn't create {}", config.output.display()))?;
    let mut out = BufWriter::new(file);
    screen.write_ppm(&mut out).context("Failed to write the image")?;
    out.flush().context("Failed to flush the image")?;
    info!("Wrote {}", config.output.display());

    Ok(())
}

/// Poll the rows-completed counter and keep the terminal updated. Purely
/// cosmetic; the render doesn't wait on it.
fn spawn_reporter(rows_done: Arc<AtomicUsize>, total: usize) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        let done = rows_done.load(Ordering::Relaxed);
        eprint!("\rScanlines remaining: {}    ", total - done);
        if done >= total {
            eprintln!();
            break;
        }
        thread::sleep(Duration::from_millis(100));
    })
}
