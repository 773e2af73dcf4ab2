#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line front end of `blocksig`. It parses the
//! `-f <path> -b <bytes>` surface with [`clap`], installs the stderr logging
//! subscriber from the `logging` crate and hands the file to
//! [`signature::FileProcessor`]. On success one `"<index> <HEX>"` line per
//! block is written to standard output in ascending index order.
//!
//! # Design
//!
//! [`run`] takes the argument iterator together with handles for standard
//! output and error so tests can drive the whole front end in memory. The
//! binary in `src/bin/blocksig.rs` only wires the process handles in and maps
//! the returned status through [`exit_code_from`].
//!
//! # Errors
//!
//! Argument errors are written to the supplied error handle and yield exit
//! code `1`. Pipeline failures are logged once where they happen and surface
//! as [`signature::SignatureError::exit_code`]. A failure while writing the
//! signature yields [`signature::EXIT_OUTPUT`].
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["blocksig", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(status, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("blocksig "));
//! assert!(stderr.is_empty());
//! ```

use std::ffi::OsString;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use checksums::ChecksumAlgorithm;
use clap::{Arg, ArgAction, Command, builder::OsStringValueParser, value_parser};
use logging::{LogConfig, LoggingError, Verbosity, init_tracing};
use signature::{
    EXIT_OUTPUT, EXIT_SYNTAX, FileProcessor, FileSource, PipelineOptions, SignatureAlgorithm,
    TextSignatureWriter,
};
use tracing::error;

const PROGRAM_NAME: &str = "blocksig";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

const HELP_TEXT: &str = concat!(
    "blocksig ",
    env!("CARGO_PKG_VERSION"),
    "\n",
    "Print a per-block signature of a file.\n",
    "\n",
    "Usage: blocksig -f <PATH> -b <BYTES> [OPTIONS]\n",
    "\n",
    "Options:\n",
    "  -f, --file <PATH>        File to sign.\n",
    "  -b, --block-size <BYTES> Block length in bytes (at least 1024).\n",
    "  -a, --checksum <ALG>     Digest: sha256 (default), sha512, sha1, md5, xxh3.\n",
    "  -j, --threads <N>        Upper bound on hash workers (default: logical CPUs).\n",
    "  -v, --verbose            Increase log detail; repeat for more.\n",
    "  -q, --quiet              Log errors only.\n",
    "  -h, --help               Show this help message and exit.\n",
    "  -V, --version            Output version information and exit.\n",
    "\n",
    "Each block is printed as \"<index> <HEX DIGEST>\", one per line.\n",
    "Set BLOCKSIG_LOG to override the log filter.\n",
);

#[derive(Debug)]
struct ParsedArgs {
    show_help: bool,
    show_version: bool,
    file: Option<PathBuf>,
    block_size: Option<u32>,
    checksum: ChecksumAlgorithm,
    threads: Option<NonZeroUsize>,
    verbose: u8,
    quiet: bool,
}

fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg_required_else_help(false)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .help("Show this help message and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .help("Output version information and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .value_name("PATH")
                .help("File to sign.")
                .value_parser(OsStringValueParser::new())
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("block-size")
                .long("block-size")
                .short('b')
                .value_name("BYTES")
                .help("Block length in bytes.")
                .value_parser(value_parser!(u32))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("checksum")
                .long("checksum")
                .short('a')
                .value_name("ALG")
                .help("Digest applied to every block.")
                .value_parser(|value: &str| value.parse::<ChecksumAlgorithm>())
                .default_value("sha256")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('j')
                .value_name("N")
                .help("Upper bound on hash workers.")
                .value_parser(value_parser!(NonZeroUsize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase log detail.")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Log errors only.")
                .action(ArgAction::SetTrue),
        )
}

fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();

    if args.is_empty() {
        args.push(OsString::from(PROGRAM_NAME));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        file: matches.remove_one::<OsString>("file").map(PathBuf::from),
        block_size: matches.remove_one::<u32>("block-size"),
        checksum: matches
            .remove_one::<ChecksumAlgorithm>("checksum")
            .unwrap_or_default(),
        threads: matches.remove_one::<NonZeroUsize>("threads"),
        verbose: matches.get_count("verbose"),
        quiet: matches.get_flag("quiet"),
    })
}

/// Runs the front end with the given arguments and output handles.
///
/// Returns the process exit status: `0` after the signature was written,
/// otherwise the code of the first failure.
#[allow(clippy::module_name_repetitions)]
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr),
        Err(error) => {
            let _ = write!(stderr, "{error}");
            EXIT_SYNTAX
        }
    }
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    let ParsedArgs {
        show_help,
        show_version,
        file,
        block_size,
        checksum,
        threads,
        verbose,
        quiet,
    } = parsed;

    if show_help {
        return if stdout.write_all(HELP_TEXT.as_bytes()).is_ok() {
            0
        } else {
            EXIT_OUTPUT
        };
    }

    if show_version {
        return if writeln!(stdout, "{PROGRAM_NAME} {VERSION}").is_ok() {
            0
        } else {
            EXIT_OUTPUT
        };
    }

    let (Some(file), Some(block_size)) = (file, block_size) else {
        let _ = writeln!(
            stderr,
            "{PROGRAM_NAME}: both -f <PATH> and -b <BYTES> are required (see --help)"
        );
        return EXIT_SYNTAX;
    };

    let config = LogConfig::new(Verbosity::from_flags(verbose, quiet))
        .with_ansi(io::stderr().is_terminal());
    match init_tracing(&config) {
        // An embedding process may already own the global subscriber.
        Ok(()) | Err(LoggingError::Install(_)) => {}
        Err(err) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {err}");
            return EXIT_SYNTAX;
        }
    }

    let options = PipelineOptions::default().with_worker_limit(threads);
    let processor = FileProcessor::new(options);
    let processed = match processor.process(
        &FileSource::new(file),
        block_size,
        &SignatureAlgorithm::new(checksum),
    ) {
        Ok(processed) => processed,
        Err(err) => return err.exit_code(),
    };

    let mut writer = TextSignatureWriter::new(BufWriter::new(stdout));
    match processed.signature().write_to(&mut writer) {
        Ok(()) => 0,
        Err(err) => {
            error!(target: "blocksig::cli", error = %err, "failed to write signature");
            EXIT_OUTPUT
        }
    }
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use signature::{EXIT_FILE_IO, EXIT_FILE_SELECT};
    use std::fs;

    fn run_with_args(args: &[&str]) -> (i32, Vec<u8>, Vec<u8>) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run(args.iter().copied(), &mut stdout, &mut stderr);
        (code, stdout, stderr)
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn parse_args_reads_short_and_long_forms() {
        let parsed = parse_args(["blocksig", "-f", "disk.img", "--block-size", "4096", "-vv"])
            .expect("parse");
        assert_eq!(parsed.file, Some(PathBuf::from("disk.img")));
        assert_eq!(parsed.block_size, Some(4096));
        assert_eq!(parsed.checksum, ChecksumAlgorithm::Sha256);
        assert_eq!(parsed.verbose, 2);
        assert!(!parsed.quiet);
        assert!(parsed.threads.is_none());
    }

    #[test]
    fn parse_args_accepts_equals_forms() {
        let parsed = parse_args(["blocksig", "-f=disk.img", "-b=2048", "--checksum=xxh3", "-j=3"])
            .expect("parse");
        assert_eq!(parsed.file, Some(PathBuf::from("disk.img")));
        assert_eq!(parsed.block_size, Some(2048));
        assert_eq!(parsed.checksum, ChecksumAlgorithm::Xxh3);
        assert_eq!(parsed.threads, NonZeroUsize::new(3));
    }

    #[test]
    fn parse_args_rejects_unknown_checksum_and_zero_threads() {
        assert!(parse_args(["blocksig", "-f", "x", "-b", "4096", "-a", "crc32"]).is_err());
        assert!(parse_args(["blocksig", "-f", "x", "-b", "4096", "-j", "0"]).is_err());
        assert!(parse_args(["blocksig", "-b", "-5"]).is_err());
    }

    #[test]
    fn empty_argument_list_reports_missing_inputs() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run(Vec::<OsString>::new(), &mut stdout, &mut stderr);
        assert_eq!(code, EXIT_SYNTAX);
        assert!(stdout.is_empty());
        assert!(String::from_utf8_lossy(&stderr).contains("required"));
    }

    #[test]
    fn help_goes_to_stdout() {
        let (code, stdout, stderr) = run_with_args(&["blocksig", "--help"]);
        assert_eq!(code, 0);
        let text = String::from_utf8(stdout).expect("utf8");
        assert!(text.contains("Usage: blocksig -f <PATH> -b <BYTES>"));
        assert!(stderr.is_empty());
    }

    #[test]
    fn version_banner() {
        let (code, stdout, _) = run_with_args(&["blocksig", "-V"]);
        assert_eq!(code, 0);
        assert_eq!(stdout, format!("blocksig {VERSION}\n").into_bytes());
    }

    #[test]
    fn unknown_option_is_a_syntax_error() {
        let (code, stdout, stderr) = run_with_args(&["blocksig", "--frobnicate"]);
        assert_eq!(code, EXIT_SYNTAX);
        assert!(stdout.is_empty());
        assert!(!stderr.is_empty());
    }

    #[test]
    fn signs_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("input.bin");
        let data = patterned(10 * 1024);
        fs::write(&path, &data).expect("write");

        let path_arg = path.to_str().expect("utf8 path");
        let (code, stdout, _) = run_with_args(&["blocksig", "-q", "-f", path_arg, "-b", "4096"]);
        assert_eq!(code, 0);

        let expected: String = [&data[..4096], &data[4096..8192], &data[8192..]]
            .iter()
            .enumerate()
            .map(|(index, block)| {
                let digest = ChecksumAlgorithm::Sha256.compute(block);
                format!("{index} {}\n", hex_upper(&digest))
            })
            .collect();
        assert_eq!(String::from_utf8(stdout).expect("utf8"), expected);
    }

    #[test]
    fn alternate_checksum_changes_digest_width() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("input.bin");
        fs::write(&path, patterned(3000)).expect("write");

        let path_arg = path.to_str().expect("utf8 path");
        let (code, stdout, _) =
            run_with_args(&["blocksig", "-q", "-f", path_arg, "-b", "1024", "-a", "md5", "-j", "2"]);
        assert_eq!(code, 0);
        let text = String::from_utf8(stdout).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for (index, line) in lines.iter().enumerate() {
            let (number, digest) = line.split_once(' ').expect("two fields");
            assert_eq!(number, index.to_string());
            assert_eq!(digest.len(), 32);
        }
    }

    #[test]
    fn missing_file_is_a_file_selection_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.bin");
        let path_arg = path.to_str().expect("utf8 path");
        let (code, stdout, _) = run_with_args(&["blocksig", "-q", "-f", path_arg, "-b", "4096"]);
        assert_eq!(code, EXIT_FILE_SELECT);
        assert!(stdout.is_empty());
    }

    #[test]
    fn directory_is_a_file_selection_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path_arg = dir.path().to_str().expect("utf8 path");
        let (code, _, _) = run_with_args(&["blocksig", "-q", "-f", path_arg, "-b", "4096"]);
        assert_eq!(code, EXIT_FILE_SELECT);
        assert_ne!(code, EXIT_FILE_IO);
    }

    #[test]
    fn tiny_block_size_is_a_syntax_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("input.bin");
        fs::write(&path, b"0123456789").expect("write");
        let path_arg = path.to_str().expect("utf8 path");
        let (code, stdout, _) = run_with_args(&["blocksig", "-q", "-f", path_arg, "-b", "4"]);
        assert_eq!(code, EXIT_SYNTAX);
        assert!(stdout.is_empty());
    }

    #[test]
    fn failed_output_write_maps_to_output_code() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> io::Result<()> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("input.bin");
        fs::write(&path, patterned(2048)).expect("write");
        let path_arg = path.to_str().expect("utf8 path");

        let mut stderr = Vec::new();
        let code = run(
            ["blocksig", "-q", "-f", path_arg, "-b", "1024"],
            &mut Closed,
            &mut stderr,
        );
        assert_eq!(code, EXIT_OUTPUT);
    }

    #[test]
    fn exit_code_is_clamped() {
        assert_eq!(exit_code_from(-3), std::process::ExitCode::from(0));
        assert_eq!(exit_code_from(23), std::process::ExitCode::from(23));
        assert_eq!(exit_code_from(4096), std::process::ExitCode::from(u8::MAX));
    }

    fn hex_upper(bytes: &[u8]) -> String {
        bytes.iter().map(|byte| format!("{byte:02X}")).collect()
    }
}
