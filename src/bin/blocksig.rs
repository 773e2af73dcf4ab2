#![deny(unsafe_code)]

use mimalloc::MiMalloc;

/// High-performance memory allocator for the per-block digest allocations.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::{env, io, process::ExitCode};

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let status = cli::run(env::args_os(), &mut stdout, &mut stderr);
    cli::exit_code_from(status)
}
