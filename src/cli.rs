use clap::Parser;

/// Language server for Little Man Computer assembly
#[derive(Parser, Debug)]
#[command(version)]
pub(crate) struct Cli {
    /// Accept one client connection over TCP instead of using stdio
    #[arg(long)]
    pub listen: bool,
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    /// Run diagnostics on the provided files and print results to stdout
    #[arg(long, num_args = 1..)]
    pub diagnose: Vec<std::path::PathBuf>,
    /// Limit the diagnostics printed per file in --diagnose mode
    #[arg(long, default_value_t = 1000)]
    pub max_problems: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_diagnose_mode() {
        let cli = Cli::parse_from(["lmclsp", "--diagnose", "a.lmc", "b.lmc", "--max-problems", "3"]);
        assert_eq!(cli.diagnose.len(), 2);
        assert_eq!(cli.max_problems, 3);
        assert!(!cli.listen);
    }

    #[test]
    fn defaults_to_stdio() {
        let cli = Cli::parse_from(["lmclsp"]);
        assert!(cli.diagnose.is_empty());
        assert!(cli.host.is_none());
        assert_eq!(cli.max_problems, 1000);
    }
}
