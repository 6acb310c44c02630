// ============================================================
// Layer 6 — Tag Report
// ============================================================
// Writes the aggregated document table (one TaggedRecord per
// sentence) as CSV or JSON, for inspecting what the tagger saw
// before highlight selection.
//
// Example CSV output:
//   position,sentence,tag,prob,tense
//   0,"The method improves accuracy.",method,0.600000,Pres
//   1,"We find that performance increases by 10%.",result,0.700000,Pres
//
// Sentences are always quoted; embedded quotes are doubled.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::domain::record::TaggedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv"  => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other  => Err(format!("unknown report format '{other}' (expected csv or json)")),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv  => "csv",
            Self::Json => "json",
        })
    }
}

pub struct TagReport<'a> {
    records: &'a [TaggedRecord],
}

impl<'a> TagReport<'a> {
    pub fn new(records: &'a [TaggedRecord]) -> Self {
        Self { records }
    }

    pub fn write<W: Write>(&self, out: &mut W, format: ReportFormat) -> Result<()> {
        match format {
            ReportFormat::Csv  => self.write_csv(out),
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, self.records)?;
                writeln!(out)?;
                Ok(())
            }
        }
    }

    /// Write the report to a file, replacing it if it exists.
    pub fn write_to_path(&self, path: &Path, format: ReportFormat) -> Result<()> {
        let mut f = fs::File::create(path)
            .with_context(|| format!("Cannot create report '{}'", path.display()))?;
        self.write(&mut f, format)?;
        tracing::debug!("Wrote {} rows to '{}'", self.records.len(), path.display());
        Ok(())
    }

    fn write_csv<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "position,sentence,tag,prob,tense")?;
        for r in self.records {
            writeln!(
                out,
                "{},\"{}\",{},{:.6},{}",
                r.position,
                r.sentence.replace('"', "\"\""),
                r.tag,
                r.probability,
                r.tense,
            )?;
        }
        Ok(())
    }
}
