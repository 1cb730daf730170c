use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(version, about = None, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Source code input file
    pub input_file: PathBuf,

    /// Execution mode
    #[arg(value_enum)]
    #[arg(short, long)]
    #[arg(default_value_t = Mode::Emit)]
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Print the token stream
    Tokens,

    /// Inspect the concrete syntax tree, repaired where tokens are missing
    Concrete,

    /// Inspect the abstract syntax tree
    Abstract,

    /// Compile the source code to target text
    Emit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_emit() {
        let args = Args::try_parse_from(["spargel", "main.sp"]).unwrap();
        assert_eq!(args.mode, Mode::Emit);
        assert_eq!(args.input_file, PathBuf::from("main.sp"));
    }

    #[test]
    fn dump_modes() {
        let args = Args::try_parse_from(["spargel", "main.sp", "--mode", "abstract"]).unwrap();
        assert_eq!(args.mode, Mode::Abstract);

        let args = Args::try_parse_from(["spargel", "-m", "tokens", "main.sp"]).unwrap();
        assert_eq!(args.mode, Mode::Tokens);
    }
}
