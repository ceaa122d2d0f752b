use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::cli::Format;

#[derive(Serialize)]
struct JsonRow<'a> {
    time: f64,
    levels: &'a [f32],
}

/// Level rows as CSV (header of key names) or JSON lines.
pub struct ReportWriter<W: Write> {
    out: W,
    format: Format,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(mut out: W, format: Format, labels: &[String]) -> Result<Self> {
        if format == Format::Csv {
            write!(out, "time")?;
            for label in labels {
                write!(out, ",{}", label)?;
            }
            writeln!(out)?;
        }
        Ok(Self { out, format })
    }

    pub fn write_row(&mut self, time: f64, levels: &[f32]) -> Result<()> {
        match self.format {
            Format::Csv => {
                write!(self.out, "{:.3}", time)?;
                for level in levels {
                    write!(self.out, ",{:.4}", level)?;
                }
                writeln!(self.out)?;
            }
            Format::Json => {
                serde_json::to_writer(&mut self.out, &JsonRow { time, levels })?;
                writeln!(self.out)?;
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["A4".into(), "A#4".into()]
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut report = ReportWriter::new(Vec::new(), Format::Csv, &labels()).unwrap();
        report.write_row(0.1, &[0.5, 0.0]).unwrap();
        let text = String::from_utf8(report.finish().unwrap()).unwrap();
        assert_eq!(text, "time,A4,A#4\n0.100,0.5000,0.0000\n");
    }

    #[test]
    fn json_lines_parse_back() {
        let mut report = ReportWriter::new(Vec::new(), Format::Json, &labels()).unwrap();
        report.write_row(0.25, &[1.0, 0.125]).unwrap();
        report.write_row(0.5, &[0.0, 0.0]).unwrap();
        let text = String::from_utf8(report.finish().unwrap()).unwrap();
        let rows: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["time"], 0.25);
        assert_eq!(rows[0]["levels"][1], 0.125);
    }
}
