use std::io::{self, Write};

use serde::Serialize;

use crate::app::SpeciesListing;
use crate::benchmark::ResultsTable;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TableOutput;

impl TableOutput {
    pub fn print_species(listing: &[SpeciesListing]) -> io::Result<()> {
        let rows = listing
            .iter()
            .map(|item| {
                vec![
                    item.species.clone(),
                    or_unknown(item.metadata.n_markers),
                    or_unknown(item.metadata.n_genotypes),
                    or_unknown(item.metadata.n_traits),
                ]
            })
            .collect::<Vec<_>>();
        let headers = ["Species", "Markers", "Genotypes", "Traits"].map(str::to_string);
        Self::write(&mut io::stdout(), &headers, &rows, &[false, true, true, true])
    }

    pub fn print_results(table: &ResultsTable) -> io::Result<()> {
        let right = vec![false; table.columns().len()];
        Self::write(&mut io::stdout(), table.columns(), table.rows(), &right)
    }

    pub fn write<W: Write>(
        out: &mut W,
        headers: &[String],
        rows: &[Vec<String>],
        right: &[bool],
    ) -> io::Result<()> {
        let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
        for row in rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let render = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, &width))| {
                    if right.get(i).copied().unwrap_or(false) {
                        format!("{cell:>width$}")
                    } else {
                        format!("{cell:<width$}")
                    }
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        writeln!(out, "{}", render(headers))?;
        let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ");
        writeln!(out, "{rule}")?;
        for row in rows {
            writeln!(out, "{}", render(row.as_slice()))?;
        }
        Ok(())
    }
}

fn or_unknown(value: Option<u64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}
