// =========================================================
// bbsgen — command-line front end over the seekable BBS
// generator core.
// =========================================================

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use bbs_rng::bbs::BbsGenerator;
use bbs_rng::error::BbsError;
use bbs_rng::persist::{load_state, save_state};

use clap::{Parser, Subcommand};

#[derive(Debug)]
enum AppError {
    Bbs(BbsError),
    Io(std::io::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Bbs(e) => write!(f, "generator error: {e}"),
            AppError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl From<BbsError> for AppError {
    fn from(e: BbsError) -> Self {
        AppError::Bbs(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e)
    }
}

/// Seekable Blum-Blum-Shub cryptographic bit generator.
#[derive(Parser)]
#[command(name = "bbsgen", version, about = "Seekable BBS CSPRNG")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Emit a stream of raw output bytes to stdout.
    Stream {
        /// Bit-width of each safe prime (modulus is roughly 2x this).
        #[arg(long, default_value_t = 512)]
        bits: u32,

        /// Number of output bytes to emit. Omit for an unbounded stream
        /// that runs until the output pipe closes.
        #[arg(long)]
        length: Option<u64>,

        /// Number of worker threads to race during safe-prime search.
        #[arg(long)]
        parallel: Option<usize>,

        /// Load initial state from a previously saved record instead of
        /// generating fresh safe primes.
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save the resulting state after streaming, for later resumption.
        #[arg(long)]
        save_state: Option<PathBuf>,
    },

    /// Generate a small fixed-size demo trace: construct a generator, emit
    /// a few bytes, seek backward, and replay to show the two runs agree.
    Demo {
        #[arg(long, default_value_t = 512)]
        bits: u32,

        #[arg(long)]
        parallel: Option<usize>,
    },
}

fn main() {
    let args = Args::parse();
    let result = match args.command {
        Command::Stream { bits, length, parallel, load_state: load, save_state: save } => {
            run_stream(bits, length, parallel, load, save)
        }
        Command::Demo { bits, parallel } => run_demo(bits, parallel),
    };

    if let Err(e) = result {
        eprintln!("[FATAL] {e}");
        std::process::exit(1);
    }
}

fn run_stream(
    bits: u32,
    length: Option<u64>,
    parallel: Option<usize>,
    load: Option<PathBuf>,
    save: Option<PathBuf>,
) -> Result<(), AppError> {
    let mut generator = match load {
        Some(path) => {
            eprintln!("[bbsgen] loading state from {}", path.display());
            load_state(path.to_str().expect("state path must be valid UTF-8"))?
        }
        None => {
            eprintln!("[bbsgen] generating fresh {bits}-bit safe primes...");
            let t = Instant::now();
            let generator = BbsGenerator::new(bits, parallel)?;
            eprintln!("[bbsgen] ready in {:.3?} (modulus {} bits)", t.elapsed(), generator.modulus().bits());
            generator
        }
    };

    // Little-endian 64-bit words, unconditionally, so the stream is
    // reproducible across platforms regardless of host byte order.
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut words_remaining = length.map(|bytes| (bytes + 7) / 8);

    loop {
        if let Some(remaining) = words_remaining {
            if remaining == 0 {
                break;
            }
        }
        let word = generator.next_u64();
        match out.write_all(&word.to_le_bytes()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        if let Some(remaining) = words_remaining.as_mut() {
            *remaining -= 1;
        }
    }
    out.flush()?;

    if let Some(path) = save {
        save_state(&generator, path.to_str().expect("state path must be valid UTF-8"))?;
        eprintln!("[bbsgen] state saved to {}", path.display());
    }

    Ok(())
}

fn run_demo(bits: u32, parallel: Option<usize>) -> Result<(), AppError> {
    println!("==============================================");
    println!("  BBS generator demo");
    println!("==============================================");

    let t = Instant::now();
    let mut generator = BbsGenerator::new(bits, parallel)?;
    let keygen_time = t.elapsed();

    println!("\n  modulus            = {} bits", generator.modulus().bits());
    println!("  carmichael exponent = {} bits", generator.carmichael_exponent().bits());
    println!("  safe-prime search  : {keygen_time:.3?}");

    let t = Instant::now();
    let forward = generator.next_byte_vec(16);
    let stream_time = t.elapsed();
    println!("\n  first 16 bytes     : {}", hex_dump(&forward));
    println!("  position after read: {}", generator.pos());
    println!("  streaming time     : {stream_time:.3?}");

    let saved_pos = generator.pos();
    generator.seek(saved_pos - 16 * 8);
    let replay = generator.next_byte_vec(16);

    println!("\n  replay after seek  : {}", hex_dump(&replay));
    if replay == forward {
        println!("  seek + replay reproduced the original 16 bytes exactly");
    } else {
        println!("  MISMATCH: replay does not match the original stream");
    }

    println!("==============================================");
    Ok(())
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join("")
}
