//! Stream-chunk generator CLI — resolves one chunk coordinate through the
//! full pipeline and writes its container bytes to disk (or prints
//! summary stats), exercising the same path an HTTP chunk-fetch endpoint
//! would call.
//!
//! Usage: cargo run --release --bin generate_chunk -- [OPTIONS]
//!
//! Options:
//!   --world <DIR>   World directory (default: "assets/worlds/demo")
//!   --cx <N>        Chunk X coordinate (default: 0)
//!   --cy <N>        Chunk Y coordinate (default: 0)
//!   --cz <N>        Chunk Z coordinate (default: 0)
//!   --out <FILE>    Write container bytes here instead of the world cache

use std::path::PathBuf;
use std::time::Instant;

use chunkdag::world::World;

#[tokio::main]
async fn main() {
    chunkdag::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let world_dir = parse_str_arg(&args, "--world").unwrap_or_else(|| "assets/worlds/demo".to_string());
    let cx = parse_i64_arg(&args, "--cx").unwrap_or(0);
    let cy = parse_i64_arg(&args, "--cy").unwrap_or(0);
    let cz = parse_i64_arg(&args, "--cz").unwrap_or(0);
    let out = parse_str_arg(&args, "--out");

    println!("=== Chunk Generator ===");
    println!("World: {world_dir}");
    println!("Chunk: ({cx}, {cy}, {cz})");

    let world_dir = PathBuf::from(world_dir);
    let world = World::open("cli", &world_dir).await.expect("failed to open world");

    let started = Instant::now();
    let bytes = world.get_chunk(cx, cy, cz).await.expect("chunk generation failed");
    let elapsed = started.elapsed();

    println!("Bytes:   {}", bytes.len());
    println!("Elapsed: {:.2}ms", elapsed.as_secs_f64() * 1000.0);

    if let Some(out) = out {
        std::fs::write(&out, bytes.as_slice()).expect("failed to write output file");
        println!("Wrote:   {out}");
    }
}

fn parse_i64_arg(args: &[String], flag: &str) -> Option<i64> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).map(|s| s.clone())
}
