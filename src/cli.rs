use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Answer stock questions against spreadsheet inventory exports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer which semantic role each column of an export plays
    Roles(RolesArgs),
    /// Answer a natural-language stock question against an export
    Query(QueryArgs),
    /// Autocomplete a partial search term from the export's vocabulary
    Suggest(SuggestArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV/TSV inventory export
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct RolesArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// The question to answer, e.g. "que hay en talle 42"
    pub question: String,
    /// Only include rows with positive stock
    #[arg(long = "stock-only")]
    pub stock_only: bool,
    /// Only include rows with negative stock
    #[arg(long = "negative-only", conflicts_with = "stock_only")]
    pub negative_only: bool,
    /// Only include rows with exactly one unit in stock
    #[arg(long = "single-unit")]
    pub single_unit: bool,
    /// Restrict results to one brand
    #[arg(long)]
    pub brand: Option<String>,
    /// Restrict results to one category
    #[arg(long)]
    pub category: Option<String>,
    /// Minimum size (leading numeric value)
    #[arg(long = "size-min")]
    pub size_min: Option<f64>,
    /// Maximum size (leading numeric value)
    #[arg(long = "size-max")]
    pub size_max: Option<f64>,
}

#[derive(Debug, Args)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Partial word to complete (at least two characters)
    pub prefix: String,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_aliases() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
