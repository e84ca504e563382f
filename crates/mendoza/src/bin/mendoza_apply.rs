//! `mendoza-apply`: apply a mendoza patch to a JSON document.
//!
//! Usage:
//!   mendoza-apply [--rebase] '<patch-array-json>'
//!
//! The document is read from stdin; the patched document is written to
//! stdout. Log output goes to stderr and is controlled by `RUST_LOG`.

use std::io::{self, Read, Write};

use mendoza::cli::{apply_patch_json, parse_args};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match apply_patch_json(buf.trim(), &args.patch, args.rebase) {
        Ok(result) => {
            let mut stdout = io::stdout().lock();
            let written = stdout.write_all(result.as_bytes()).and_then(|_| stdout.write_all(b"\n"));
            if let Err(e) = written {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
