//! Runs a short scripted sequence of reads and writes against one cache and
//! prints the cache state after every call.

use clap::Parser;
use keyed_lru::{Cache, LruCache};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lru_demo", about = "Exercise an LRU cache step by step")]
struct Args {
    /// Maximum number of cached entries
    #[arg(short, long, default_value_t = 3)]
    capacity: usize,

    /// Only log the steps, do not print cache dumps
    #[arg(short, long)]
    quiet: bool,
}

enum Step {
    Read(&'static str),
    Write(&'static str, &'static str),
}

const SCRIPT: &[Step] = &[
    Step::Read("a"),
    Step::Write("a", "1"),
    Step::Write("a", "2"),
    Step::Write("b", "3"),
    Step::Write("b", "4"),
    Step::Write("a", "5"),
];

fn apply<C: Cache<&'static str, &'static str>>(cache: &mut C, step: &Step) {
    match *step {
        Step::Read(key) => match cache.read(&key) {
            Some(value) => info!(key, value, "read hit"),
            None => info!(key, "read miss"),
        },
        Step::Write(key, value) => match cache.write(key, value) {
            Ok(Some(old)) => info!(key, value, old, "overwrote entry"),
            Ok(None) => info!(key, value, "inserted entry"),
            Err(e) => warn!(key, error = %e, "write rejected"),
        },
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut cache: LruCache<&str, &str> = LruCache::new(args.capacity)?;

    for (i, step) in SCRIPT.iter().enumerate() {
        println!("{}", i);
        apply(&mut cache, step);
        if !args.quiet {
            print!("{}", cache.inspect());
        }
    }

    Ok(())
}
