use clap::Args;

#[derive(Debug, Args)]
#[clap(next_help_heading = "Machine Options")]
pub struct GlobalOpts {
    /// Print the first 50 words of memory before running
    #[arg(long)]
    pub dump_memory: bool,

    /// Wrap out-of-range addresses and treat unknown opcodes as nop, instead of faulting
    #[arg(long)]
    pub compat: bool,

    /// Log every executed instruction
    #[arg(long)]
    pub trace: bool,

    /// Give up after this many instructions
    #[arg(long, value_name = "N")]
    pub max_steps: Option<u64>,
}

impl GlobalOpts {
    /// Log filter to use when RUST_LOG is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.trace {
            "trace"
        } else {
            "warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[clap(flatten)]
        global: GlobalOpts,
    }

    #[test]
    fn defaults() {
        let cli = TestCli::parse_from(["runcool"]);
        assert!(!cli.global.dump_memory);
        assert!(!cli.global.compat);
        assert_eq!(cli.global.max_steps, None);
        assert_eq!(cli.global.default_log_filter(), "warn");
    }

    #[test]
    fn all_flags() {
        let cli = TestCli::parse_from([
            "runcool",
            "--dump-memory",
            "--compat",
            "--trace",
            "--max-steps",
            "1000",
        ]);
        assert!(cli.global.dump_memory);
        assert!(cli.global.compat);
        assert_eq!(cli.global.max_steps, Some(1000));
        assert_eq!(cli.global.default_log_filter(), "trace");
    }
}
