//! Command-line arguments for the `learngap` binary.

use crate::config::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// LearnGap - learning-gap analysis for assessment responses
///
/// Reads a spreadsheet of student answers (one row per student, question
/// and attempt) and reports the questions the cohort struggles with, each
/// student's weak questions and where their pacing differs from the class.
///
/// Examples:
///   learngap --input Formative_M1.xlsx
///   learngap --input Formative_M1.xlsx --top-n 5
///   learngap --input Formative_M1.xlsx --format json --output analysis.json
///   learngap --input Formative_M1.xlsx --export
///   learngap --input Formative_M1.xlsx --dry-run
///   learngap --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Spreadsheet of assessment responses
    ///
    /// Required columns: Question ID, Question Text, Login ID,
    /// Answer Status, TimeSpent (InSeconds), Attempt ID.
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Sheet to read (defaults to the first sheet)
    #[arg(short, long, value_name = "NAME", env = "LEARNGAP_SHEET")]
    pub sheet: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to FILE instead of standard output
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also export a multi-sheet spreadsheet
    ///
    /// Without a value, writes learning_gaps_analysis.xlsx.
    #[arg(short, long, value_name = "FILE", num_args = 0..=1)]
    pub export: Option<Option<PathBuf>>,

    /// Only report the N students with the lowest accuracy
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Abort loading and analysis after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .learngap.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load and check the spreadsheet without analysing it
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .learngap.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.input {
            None => return Err("An input spreadsheet is required (--input)".to_string()),
            Some(ref input) if !input.is_file() => {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            Some(_) => {}
        }

        if self.top_n == Some(0) {
            return Err("--top-n must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_args(input: Option<PathBuf>) -> Args {
        Args {
            input,
            sheet: None,
            format: None,
            output: None,
            export: None,
            top_n: None,
            timeout: None,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    fn existing_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "placeholder").unwrap();
        file
    }

    #[test]
    fn test_validation_missing_input() {
        let args = make_args(Some(PathBuf::from("/definitely/not/here.xlsx")));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = existing_file();
        let mut args = make_args(Some(file.path().to_path_buf()));
        assert!(args.validate().is_ok());

        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_top_n_and_timeout() {
        let file = existing_file();
        let mut args = make_args(Some(file.path().to_path_buf()));

        args.top_n = Some(0);
        assert!(args.validate().is_err());

        args.top_n = Some(3);
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args(None);
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_export_flag_without_value() {
        let args = Args::parse_from(["learngap", "--input", "a.xlsx", "--export"]);
        assert_eq!(args.export, Some(None));

        let args = Args::parse_from(["learngap", "-i", "a.xlsx", "--export", "out.xlsx"]);
        assert_eq!(args.export, Some(Some(PathBuf::from("out.xlsx"))));
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(None);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
