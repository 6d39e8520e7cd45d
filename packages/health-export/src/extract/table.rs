//! In-memory table and its text rendering.

use std::io::{self, Write};

use crate::classify::Kind;
use crate::format::SEPARATOR;

/// A fully built table for one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub kind: Kind,
    /// Column names, written once before any row.
    pub header: Vec<String>,
    /// Formatted rows, in document order.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has a header only.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the header and all rows.
    pub fn write_csv(&self, mut writer: impl Write) -> io::Result<()> {
        write_line(&mut writer, &self.header)?;
        for row in &self.rows {
            write_line(&mut writer, row)?;
        }
        Ok(())
    }

    /// Render the table as text.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_line(&mut out, &self.header);
        for row in &self.rows {
            push_line(&mut out, row);
        }
        out
    }
}

/// Write one newline-terminated line of already formatted fields.
pub fn write_line<S: AsRef<str>>(writer: &mut impl Write, fields: &[S]) -> io::Result<()> {
    let mut line = String::new();
    push_line(&mut line, fields);
    writer.write_all(line.as_bytes())
}

fn push_line<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(field.as_ref());
    }
    out.push('\n');
}
