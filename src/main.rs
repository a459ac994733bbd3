use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::bail;
use clap::Parser;
use common::cli::GlobalOpts;
use coolcpu::{Core, Mode, Reason, Word};

/// Words shown by --dump-memory
const DUMP_WORDS: u16 = 50;

#[derive(Debug, Parser)]
#[clap(name = "runcool", version, about = "Run a program image on the cool stack machine")]
struct Cli {
    /// Program image: 16-bit little-endian words, loaded at address 0
    program: PathBuf,

    #[clap(flatten)]
    global: GlobalOpts,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.global.default_log_filter()),
    )
    .format_timestamp(None)
    .init();

    match run(&cli) {
        Ok(result) => ExitCode::from(exit_status(result)),
        Err(e) => {
            eprintln!("runcool: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// A process exit status only carries 8 bits, so the result is truncated to its low byte.
fn exit_status(result: Word) -> u8 {
    result.as_address() as u8
}

fn run(cli: &Cli) -> anyhow::Result<Word> {
    let image = common::image::load_image(&cli.program)?;
    log::debug!("Running {}", cli.program.display());

    let stdout = io::stdout();
    run_image(&image, &cli.global, &mut stdout.lock())
}

fn run_image(image: &[u16], opts: &GlobalOpts, out: &mut dyn Write) -> anyhow::Result<Word> {
    let mode = if opts.compat {
        Mode::Compatible
    } else {
        Mode::Hardened
    };

    let mut core = Core::new(mode);
    core.load_image(image)?;

    if opts.dump_memory {
        dump_memory(&core, out)?;
    }

    let result = execute(&mut core, opts.max_steps, out);

    // A faulted run still reports its memory traffic, and the fault outranks a failed report
    let report = write!(out, "{}", core.stats()).and_then(|()| out.flush());
    let result = result?;
    report?;

    Ok(result)
}

fn execute(core: &mut Core, max_steps: Option<u64>, out: &mut dyn Write) -> anyhow::Result<Word> {
    let Some(limit) = max_steps else {
        return Ok(core.run_until_halt(out)?);
    };

    let result = core.advance(limit, out)?;
    match result.reason {
        Reason::Halted(word) => Ok(word),
        Reason::Limited => bail!(
            "gave up after {} instructions at pc {}",
            result.steps,
            core.registers().pc()
        ),
    }
}

fn dump_memory(core: &Core, out: &mut dyn Write) -> io::Result<()> {
    for word in core.memory().dump(0..DUMP_WORDS) {
        write!(out, "{} ", word.as_address())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coolcpu::assembler::assemble;

    fn core_with(source: &str) -> Core {
        let mut core = Core::new(Mode::Hardened);
        core.load_image(&assemble(source).unwrap()).unwrap();
        core
    }

    fn opts() -> GlobalOpts {
        GlobalOpts {
            dump_memory: false,
            compat: false,
            trace: false,
            max_steps: None,
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn output_then_statistics() {
        let image = assemble("pushc 42\nprinti\npushc 300\nhalt").unwrap();
        let mut out = Vec::new();
        let result = run_image(&image, &opts(), &mut out).unwrap();

        assert_eq!(exit_status(result), 44);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "42@number-of-main-memory-reads\t8\n\
             @number-of-main-memory-writes\t2\n\
             @number-of-cache-memory-hits\t0\n\
             @number-of-cache-memory-misses\t0\n"
        );
    }

    #[test]
    fn statistics_reported_after_fault() {
        let image = assemble("pushc 1\npushc 0\ndiv\nhalt").unwrap();
        let mut out = Vec::new();
        let err = run_image(&image, &opts(), &mut out).unwrap_err();

        assert!(err.downcast_ref::<coolcpu::Fault>().is_some());
        assert_eq!(
            format!("{:#}", err),
            "fault at pc 4 (div): arithmetic fault: division by zero"
        );
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|line| line.starts_with("@number-of-")));
        assert_eq!(lines[0], "@number-of-main-memory-reads\t7");
    }

    #[test]
    fn fault_outranks_failed_report() {
        let image = assemble("pushc 1\npushc 0\ndiv\nhalt").unwrap();
        let err = run_image(&image, &opts(), &mut BrokenPipe).unwrap_err();
        assert!(err.downcast_ref::<coolcpu::Fault>().is_some());

        // without a fault the failed report is the error
        let image = assemble("pushc 1\nhalt").unwrap();
        let err = run_image(&image, &opts(), &mut BrokenPipe).unwrap_err();
        assert!(err.downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn dump_precedes_run() {
        let image = assemble("pushc 5\nhalt").unwrap();
        let mut out = Vec::new();
        let opts = GlobalOpts {
            dump_memory: true,
            ..opts()
        };
        run_image(&image, &opts, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("12 5 0 "));
        assert!(text.contains(" @number-of-main-memory-reads\t4\n"));
    }

    #[test]
    fn exit_status_is_low_byte() {
        assert_eq!(exit_status(Word::from_signed(8)), 8);
        assert_eq!(exit_status(Word::from_address(0x1234)), 0x34);
        assert_eq!(exit_status(Word::from_signed(-1)), 255);
    }

    #[test]
    fn dump_shows_first_words_unsigned() {
        let core = core_with("pushc -1\nhalt");
        let mut out = Vec::new();
        dump_memory(&core, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("12 65535 0 0 "));
        assert_eq!(text.split_whitespace().count(), DUMP_WORDS as usize);
        assert_eq!(core.stats().main_memory_reads, 0);
    }

    #[test]
    fn step_limit_is_an_error() {
        let mut core = core_with("loop: jmp loop");
        let err = execute(&mut core, Some(100), &mut io::sink()).unwrap_err();
        assert_eq!(err.to_string(), "gave up after 100 instructions at pc 0");

        let mut core = core_with("pushc 3\nhalt");
        let result = execute(&mut core, Some(100), &mut io::sink()).unwrap();
        assert_eq!(result.as_signed(), 3);
    }

    #[test]
    fn faults_propagate() {
        let mut core = core_with("pushc 1\npushc 0\ndiv\nhalt");
        let err = execute(&mut core, None, &mut io::sink()).unwrap_err();
        let fault = err.downcast_ref::<coolcpu::Fault>().unwrap();
        assert!(matches!(fault.kind(), coolcpu::FaultKind::Arithmetic));
    }
}
