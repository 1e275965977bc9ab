//! Preview grids: delimited text split into rows of fields

use std::fmt::{self, Display};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::tokenize::tokenize;

/// How to split lines into a grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    pub delimiter: String,
    pub quote: String,
    /// Maximum number of data rows; `None` reads everything
    pub limit: Option<usize>,
    /// Take column names from the first line
    pub header: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            delimiter: ",".into(),
            quote: "\"".into(),
            limit: None,
            header: true,
        }
    }
}

impl SplitOptions {
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_quote(mut self, quote: impl Into<String>) -> Self {
        self.quote = quote.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn split(&self, line: &str) -> Vec<String> {
        tokenize(line, &self.delimiter, &self.quote)
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grid {
    /// Column names; empty when the source had no header line
    pub columns: Vec<String>,
    /// Data rows; rows may differ in length
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    /// Split in-memory lines
    pub fn from_lines<I, S>(lines: I, options: &SplitOptions) -> Grid
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GridBuilder::new(options);
        for line in lines {
            if !builder.push(line.as_ref()) {
                break;
            }
        }
        builder.finish()
    }

    /// Number of columns needed to show every row
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.columns.len()))
            .max()
            .unwrap_or(0)
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.width()];
        for (i, name) in self.columns.iter().enumerate() {
            widths[i] = widths[i].max(name.chars().count());
        }
        for row in &self.rows {
            for (i, width) in widths.iter_mut().enumerate() {
                let cell = row.get(i).map_or(NULL_CELL.len(), |c| c.chars().count());
                *width = (*width).max(cell);
            }
        }
        widths
    }
}

/// Accumulates lines until the row limit is reached
struct GridBuilder<'a> {
    options: &'a SplitOptions,
    grid: Grid,
    awaiting_header: bool,
}

impl<'a> GridBuilder<'a> {
    fn new(options: &'a SplitOptions) -> Self {
        GridBuilder {
            options,
            grid: Grid::default(),
            awaiting_header: options.header,
        }
    }

    fn is_full(&self) -> bool {
        self.options
            .limit
            .is_some_and(|limit| self.grid.rows.len() >= limit)
    }

    /// Returns false once no more lines are wanted
    fn push(&mut self, line: &str) -> bool {
        if self.awaiting_header {
            self.grid.columns = self.options.split(line);
            self.awaiting_header = false;
            return !self.is_full();
        }
        if self.is_full() {
            return false;
        }
        self.grid.rows.push(self.options.split(line));
        !self.is_full()
    }

    fn finish(self) -> Grid {
        self.grid
    }
}

/// Read a local delimited file into a grid
pub fn load_grid(path: &Path, options: &SplitOptions) -> Result<Grid, LoadError> {
    let io_err = |source: io::Error| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    log::debug!(
        "Reading {} (delimiter {:?}, quote {:?})",
        path.display(),
        options.delimiter,
        options.quote
    );

    let mut builder = GridBuilder::new(options);
    for line in BufReader::new(file).lines() {
        let line = line.map_err(io_err)?;
        if !builder.push(&line) {
            log::debug!(
                "Stopped reading {} at the {}-row limit",
                path.display(),
                builder.grid.rows.len()
            );
            break;
        }
    }
    Ok(builder.finish())
}

// ============ Table printing ============

const NULL_CELL: &str = "null";

impl Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.column_widths();

        write_separator(f, &widths)?;
        if !self.columns.is_empty() {
            write_row(f, &widths, |i| {
                self.columns.get(i).map_or("", String::as_str)
            })?;
            write_separator(f, &widths)?;
        }
        for row in &self.rows {
            write_row(f, &widths, |i| row.get(i).map_or(NULL_CELL, String::as_str))?;
        }
        if !self.rows.is_empty() {
            write_separator(f, &widths)?;
        }
        Ok(())
    }
}

fn write_separator(f: &mut fmt::Formatter<'_>, widths: &[usize]) -> fmt::Result {
    write!(f, "+")?;
    for width in widths {
        write!(f, "{}+", "-".repeat(*width))?;
    }
    writeln!(f)
}

fn write_row<'a>(
    f: &mut fmt::Formatter<'_>,
    widths: &[usize],
    cell: impl Fn(usize) -> &'a str,
) -> fmt::Result {
    write!(f, "|")?;
    for (i, width) in widths.iter().enumerate() {
        write!(f, "{:>width$}|", cell(i), width = *width)?;
    }
    writeln!(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINES: [&str; 4] = ["name,city", "alice,\"Paris, FR\"", "bob,Oslo", "carol,Rome"];

    #[test]
    fn header_becomes_columns() {
        let grid = Grid::from_lines(LINES, &SplitOptions::default());
        assert_eq!(grid.columns, vec!["name", "city"]);
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.rows[0], vec!["alice", "Paris, FR"]);
    }

    #[test]
    fn without_header_every_line_is_a_row() {
        let grid = Grid::from_lines(LINES, &SplitOptions::default().with_header(false));
        assert!(grid.columns.is_empty());
        assert_eq!(grid.rows.len(), 4);
    }

    #[test]
    fn limit_counts_data_rows_only() {
        let grid = Grid::from_lines(LINES, &SplitOptions::default().with_limit(2));
        assert_eq!(grid.columns.len(), 2);
        assert_eq!(grid.rows.len(), 2);

        let grid = Grid::from_lines(LINES, &SplitOptions::default().with_limit(0));
        assert!(grid.rows.is_empty());
    }

    #[test]
    fn table_layout() {
        let grid = Grid::from_lines(["a,bb", "1,2", "333"], &SplitOptions::default());
        // the ragged row widens the second column to fit "null"
        assert_eq!(
            grid.to_string(),
            "\
+---+----+
|  a|  bb|
+---+----+
|  1|   2|
|333|null|
+---+----+
"
        );
    }

    #[test]
    fn empty_grid_prints_bare_separator() {
        let grid = Grid::default();
        assert_eq!(grid.to_string(), "+\n");
    }
}
