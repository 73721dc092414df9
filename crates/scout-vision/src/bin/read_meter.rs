//! CLI tool to read the own-elixir meter from a saved screenshot.
//! Usage: cargo run -p scout-vision --features cli --bin read_meter -- <screenshot.png> [output_dir]

use std::path::PathBuf;
use scout_vision::{crop_region, read_elixir_bar, regions, MeterCalibration};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <screenshot.png> [output_dir]", args[0]);
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let output_dir = if args.len() >= 3 {
        PathBuf::from(&args[2])
    } else {
        PathBuf::from("./debug_output")
    };
    let _ = std::fs::create_dir_all(&output_dir);

    println!("Loading image: {}", input_path.display());
    let img = match image::open(&input_path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            eprintln!("Failed to open {}: {}", input_path.display(), e);
            std::process::exit(1);
        }
    };
    let (w, h) = (img.width(), img.height());
    println!("Image size: {}x{}", w, h);

    let region = regions::elixir_bar();
    println!(
        "Elixir bar: x={:.0} y={:.0} w={:.0} h={:.0}",
        region.x * w as f64,
        region.y * h as f64,
        region.width * w as f64,
        region.height * h as f64,
    );
    let roi = crop_region(&img, &region);
    let _ = roi.save(output_dir.join("elixir_bar.png"));

    let reading = read_elixir_bar(&roi, &MeterCalibration::default());
    println!("\n=== Segments ===");
    for (i, fill) in reading.fill.iter().enumerate() {
        println!("  Segment {}: {:.0}% purple", i, fill * 100.0);
    }
    println!("Elixir: {}", reading.level);

    println!("\nDebug crop saved to: {}", output_dir.display());
}
