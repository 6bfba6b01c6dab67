//! Writers for generated strings and analyses in plain text, JSON and CSV.
//!
//! - `write_strings` emits one string per line, a JSON document with
//!   `results`, `count`, `timestamp` and `generator`, or a one-column CSV.
//! - `write_analyses` emits a short text block per analysis, a JSON array of
//!   full analyses, or a fixed-column CSV.
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::Writer;
use serde::Serialize;

use crate::analysis::PasswordAnalysis;

pub const GENERATOR_NAME: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

pub const ANALYSIS_CSV_HEADER: [&str; 10] = [
    "password",
    "strength_level",
    "strength_score",
    "entropy",
    "has_lowercase",
    "has_uppercase",
    "has_digits",
    "has_symbols",
    "vulnerabilities",
    "recommendations",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format: {other} (expected text, json or csv)")),
        }
    }
}

#[derive(Serialize)]
struct StringsDocument<'a> {
    results: &'a [String],
    count: usize,
    timestamp: DateTime<Utc>,
    generator: &'a str,
}

pub fn write_strings<W: Write>(mut w: W, items: &[String], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for item in items {
                writeln!(w, "{}", item)?;
            }
        }
        OutputFormat::Json => {
            let doc = StringsDocument {
                results: items,
                count: items.len(),
                timestamp: Utc::now(),
                generator: GENERATOR_NAME,
            };
            serde_json::to_writer_pretty(&mut w, &doc)?;
            writeln!(w)?;
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(&mut w);
            wtr.write_record(["password"])?;
            for item in items {
                wtr.write_record([item.as_str()])?;
            }
            wtr.flush()?;
        }
    }
    w.flush()?;
    Ok(())
}

pub fn write_analyses<W: Write>(
    mut w: W,
    analyses: &[PasswordAnalysis],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for (i, a) in analyses.iter().enumerate() {
                writeln!(w, "Password {}: {}", i + 1, a.password)?;
                writeln!(w, "Strength: {} ({:.1}/100)", a.strength_level, a.strength_score)?;
                writeln!(w, "Entropy: {:.1} bits", a.entropy)?;
                writeln!(w, "---")?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut w, analyses)?;
            writeln!(w)?;
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(&mut w);
            wtr.write_record(ANALYSIS_CSV_HEADER)?;
            for a in analyses {
                let vulnerabilities = a
                    .vulnerabilities
                    .iter()
                    .map(|v| v.message())
                    .collect::<Vec<_>>()
                    .join("; ");
                let c = &a.character_analysis;
                wtr.write_record([
                    a.password.clone(),
                    a.strength_level.to_string(),
                    format!("{:.1}", a.strength_score),
                    format!("{:.2}", a.entropy),
                    c.has_lowercase.to_string(),
                    c.has_uppercase.to_string(),
                    c.has_digits.to_string(),
                    c.has_symbols.to_string(),
                    vulnerabilities,
                    a.recommendations.join("; "),
                ])?;
            }
            wtr.flush()?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Run `write` against the file at `path`, or stdout when there is none.
pub fn with_output<F>(path: Option<&Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    match path {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("create {}", path.display()))?;
            let mut w = BufWriter::new(file);
            write(&mut w).with_context(|| format!("write {}", path.display()))?;
            w.flush()
                .with_context(|| format!("flush {}", path.display()))?;
            log::info!("wrote {}", path.display());
            Ok(())
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write(&mut lock)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_password;
    use tempfile::tempdir;

    fn strings() -> Vec<String> {
        vec!["Zq7#xvK2".to_string(), "a,b\"c".to_string()]
    }

    #[test]
    fn parses_formats() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("txt".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn strings_as_text_and_csv() {
        let mut text = Vec::new();
        write_strings(&mut text, &strings(), OutputFormat::Text).unwrap();
        assert_eq!(String::from_utf8(text).unwrap(), "Zq7#xvK2\na,b\"c\n");

        let mut csv = Vec::new();
        write_strings(&mut csv, &strings(), OutputFormat::Csv).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "password\nZq7#xvK2\n\"a,b\"\"c\"\n"
        );
    }

    #[test]
    fn strings_as_json_document() {
        let mut out = Vec::new();
        write_strings(&mut out, &strings(), OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["count"], 2);
        assert_eq!(v["results"][0], "Zq7#xvK2");
        assert_eq!(v["generator"], GENERATOR_NAME);
        assert!(v["timestamp"].as_str().is_some_and(|t| t.contains('T')));
    }

    #[test]
    fn analyses_as_csv_have_fixed_columns() {
        let analyses = vec![analyze_password("password123", None)];
        let mut out = Vec::new();
        write_analyses(&mut out, &analyses, OutputFormat::Csv).unwrap();
        let mut rdr = csv::Reader::from_reader(out.as_slice());
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, ANALYSIS_CSV_HEADER);
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "password123");
        assert_eq!(&row[1], "WEAK");
        assert!(row[8].contains("Password found in common password lists"));
    }

    #[test]
    fn analyses_as_text_and_json_file() {
        let analyses = vec![analyze_password("hunter2", None)];
        let mut text = Vec::new();
        write_analyses(&mut text, &analyses, OutputFormat::Text).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("Password 1: hunter2\nStrength: "));
        assert!(text.ends_with("---\n"));

        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        with_output(Some(path.as_path()), |w| write_analyses(w, &analyses, OutputFormat::Json)).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v[0]["password"], "hunter2");
        assert!(v[0]["display_digests"]["sha256"].is_string());
    }
}
