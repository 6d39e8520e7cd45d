//! Value formatting for table rows.
//!
//! Tables use a restricted CSV dialect: string fields are double-quoted with
//! `\` and `"` backslash-escaped, numbers and datetimes are bare tokens, and
//! absent values are empty. [`table_reader`] reads that dialect back.

use std::io;

use crate::error::Result;
use crate::types::FieldType;

/// Field separator within a row.
pub const SEPARATOR: char = ',';

/// Render one typed value.
///
/// # Examples
/// ```
/// use health_export::format::format_field;
/// use health_export::types::FieldType;
///
/// assert_eq!(format_field(Some("Watch"), FieldType::String), "\"Watch\"");
/// assert_eq!(format_field(Some("120"), FieldType::Number), "120");
/// assert_eq!(format_field(None, FieldType::String), "");
/// ```
#[must_use]
pub fn format_field(value: Option<&str>, field_type: FieldType) -> String {
    let Some(value) = value else {
        return String::new();
    };

    match field_type {
        FieldType::String => quote(value),
        FieldType::Number | FieldType::DateTime => value.to_string(),
    }
}

/// Render one value given its type code (`s`, `n`, `d` or the long names).
///
/// An absent value is empty text whatever the type code.
///
/// # Errors
/// `ExportError::UnsupportedType` for any other type code.
///
/// # Examples
/// ```
/// use health_export::format::format_value;
///
/// assert_eq!(format_value(Some("2024-01-01"), "d").unwrap(), "2024-01-01");
/// assert!(format_value(Some("x"), "q").is_err());
/// assert_eq!(format_value(None, "q").unwrap(), "");
/// ```
pub fn format_value(value: Option<&str>, type_code: &str) -> Result<String> {
    if value.is_none() {
        return Ok(String::new());
    }
    let field_type: FieldType = type_code.parse()?;
    Ok(format_field(value, field_type))
}

/// Quote a string, escaping backslashes and double quotes.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// CSV reader configured for the table dialect.
///
/// The first record is the header, and every row must have the header's
/// arity. Quoted fields come back unescaped.
///
/// # Examples
/// ```
/// use health_export::format::table_reader;
///
/// let table = "source,steps\n\"He said \\\"hi\\\"\",120\n";
/// let mut reader = table_reader(table.as_bytes());
/// let row = reader.records().next().unwrap().unwrap();
/// assert_eq!(&row[0], "He said \"hi\"");
/// assert_eq!(&row[1], "120");
/// ```
pub fn table_reader<R: io::Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(SEPARATOR as u8)
        .escape(Some(b'\\'))
        .double_quote(false)
        .has_headers(true)
        .from_reader(input)
}
