//! Command-line argument parsing for docqa
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::config::Config;

/// docqa - Answer questions from the PostgreSQL documentation
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Grounded question answering over a documentation corpus", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -v (info), -vv (debug), -vvv (trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only, no progress bars)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split raw documents into overlapping token windows
    Chunk {
        /// Directory of document JSON files
        #[arg(long)]
        input: Option<PathBuf>,

        /// Chunk snapshot to write
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Embed chunks and write the vector index snapshot
    Index {
        /// Chunk snapshot to read
        #[arg(long)]
        chunks: Option<PathBuf>,
    },

    /// Answer a question
    Ask {
        /// The question
        #[arg(value_name = "QUESTION")]
        question: String,

        /// JSON file with prior turns: [{"role": "user", "content": "..."}]
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        #[command(flatten)]
        search: SearchArgs,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the chunks a query retrieves, without generating
    Retrieve {
        /// The query
        #[arg(value_name = "QUERY")]
        query: String,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Show index statistics
    Info,

    /// Display current configuration
    Config,
}

/// Retrieval overrides
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Number of candidates to retrieve
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Minimum cosine similarity
    #[arg(long)]
    pub threshold: Option<f32>,
}

impl SearchArgs {
    /// Apply overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
        if let Some(threshold) = self.threshold {
            config.retrieval.similarity_threshold = threshold;
        }
    }
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if retrieved chunks should be printed alongside answers
    pub fn show_chunks(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let args = Args::parse_from([
            "docqa", "-v", "ask", "How do I retrieve rows?", "--top-k", "8", "--threshold", "0.3",
        ]);
        assert_eq!(args.verbosity(), Verbosity::Verbose);
        match args.command {
            Commands::Ask {
                question, search, history, json,
            } => {
                assert_eq!(question, "How do I retrieve rows?");
                assert_eq!(search.top_k, Some(8));
                assert_eq!(search.threshold, Some(0.3));
                assert!(history.is_none());
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["docqa", "info", "-q", "--config", "/tmp/docqa.toml"]);
        assert_eq!(args.verbosity(), Verbosity::Quiet);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/docqa.toml")));
    }

    #[test]
    fn test_search_overrides() {
        let mut config = Config::default();
        SearchArgs {
            top_k: Some(3),
            threshold: None,
        }
        .apply(&mut config);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.similarity_threshold, 0.25);
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());
        assert!(!Verbosity::Normal.show_chunks());
        assert!(Verbosity::VeryVerbose.show_chunks());
    }
}
