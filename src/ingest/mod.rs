// src/ingest/mod.rs
//
// Row source for enrollment query extracts. The query output starts with a
// few report lines before the real header (first cell `Institution`); data
// rows follow. Header names are normalized once and mapped onto
// `RawEnrollmentRow`, so nothing downstream depends on the exporter's
// column spelling.

pub mod row;

use csv::{ReaderBuilder, StringRecord};
use std::{
    collections::HashMap,
    fs::File,
    io::{Cursor, Read},
    path::Path,
};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub use row::{Column, RawEnrollmentRow};

/// First cell of the header row in enrollment extracts.
pub const HEADER_MARKER: &str = "Institution";

/// Lowercase, spaces to `_`, drop `?`, `#` to `num`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('?', "")
        .replace('#', "num")
}

/// Header position of every schema column present in the file.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    positions: HashMap<Column, usize>,
}

impl ColumnMap {
    /// Map normalized header names onto the schema. Fails if a required
    /// column is absent; unknown headers are ignored.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| normalize_header(h.as_ref()))
            .collect();
        let mut positions = HashMap::new();
        for col in Column::ALL {
            let found = col
                .aliases()
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias));
            match found {
                Some(idx) => {
                    positions.insert(col, idx);
                }
                None if col.is_required() => {
                    return Err(Error::MissingColumn(col.label().into()));
                }
                None => debug!(column = col.label(), "optional column absent"),
            }
        }
        Ok(Self { positions })
    }

    fn get<'a>(&self, record: &'a [String], col: Column) -> &'a str {
        self.positions
            .get(&col)
            .and_then(|&i| record.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Build a row from already padded fields.
    pub fn to_row(&self, fields: &[String]) -> RawEnrollmentRow {
        let text = |col| self.get(fields, col).trim().to_string();
        let mut meeting_days = [false; 7];
        for (day, col) in meeting_days.iter_mut().zip(Column::DAYS) {
            *day = self.get(fields, col).trim().eq_ignore_ascii_case("Y");
        }
        RawEnrollmentRow {
            institution: text(Column::Institution),
            term: text(Column::Term),
            session: text(Column::Session),
            subject: text(Column::Subject),
            catalog_number: text(Column::CatalogNumber),
            title: text(Column::Title),
            class_number: text(Column::ClassNumber),
            section: text(Column::Section),
            status: text(Column::Status),
            component: text(Column::Component),
            enrollment: text(Column::Enrollment),
            limit: text(Column::Limit),
            room: text(Column::Room),
            meeting_days,
            meeting_start: text(Column::MeetingStart),
            meeting_end: text(Column::MeetingEnd),
            instruction_mode: text(Column::InstructionMode),
            instructor: text(Column::Instructor),
            role: text(Column::Role),
            attributes: text(Column::Attributes),
            fees: text(Column::Fees),
            notes: text(Column::Notes),
            career: text(Column::Career),
            primary_component: text(Column::PrimaryComponent),
            sysdate: text(Column::Sysdate),
        }
    }
}

/// Everything read from one extract.
#[derive(Debug, Default)]
pub struct Extract {
    /// Header cells as they appear in the file (BOM removed).
    pub headers: Vec<String>,
    pub rows: Vec<RawEnrollmentRow>,
    /// Rows shorter than the header, padded with empty fields.
    pub padded_rows: usize,
    /// Report lines skipped before the header.
    pub preamble_lines: usize,
}

/// Header row plus padded data rows of one CSV buffer.
#[derive(Debug, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub preamble_lines: usize,
    pub padded_rows: usize,
}

/// Split a CSV buffer into its header row and the data rows after it.
/// With a `marker`, lines before the row whose first cell equals it are
/// skipped; without one the first line is the header.
pub fn read_table(data: &[u8], marker: Option<&str>) -> Result<Table> {
    // invalid UTF-8 in free-text columns is common in these extracts
    let text = String::from_utf8_lossy(data);
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(text.as_bytes()));

    let mut table = Table::default();
    let mut have_header = false;
    let mut record = StringRecord::new();

    while rdr.read_record(&mut record)? {
        if !have_header {
            let first = record
                .get(0)
                .unwrap_or("")
                .trim_start_matches('\u{feff}')
                .trim();
            if marker.map_or(true, |m| first == m) {
                table.headers = record.iter().map(str::to_string).collect();
                table.headers[0] = first.to_string();
                have_header = true;
            } else {
                table.preamble_lines += 1;
            }
            continue;
        }
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        if fields.len() < table.headers.len() {
            debug!(
                line = record.position().map(|p| p.line()),
                have = fields.len(),
                want = table.headers.len(),
                "padding short row"
            );
            fields.resize(table.headers.len(), String::new());
            table.padded_rows += 1;
        }
        table.rows.push(fields);
    }

    if !have_header {
        return Err(Error::MissingHeader(marker.unwrap_or("").to_string()));
    }
    Ok(table)
}

/// Read an enrollment extract from any byte source.
pub fn read_extract<R: Read>(mut reader: R) -> Result<Extract> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;

    let table = read_table(&buf, Some(HEADER_MARKER))?;
    let columns = ColumnMap::from_headers(&table.headers)?;
    let rows = table.rows.iter().map(|fields| columns.to_row(fields)).collect();

    if table.padded_rows > 0 {
        warn!(padded_rows = table.padded_rows, "rows shorter than header were padded");
    }
    Ok(Extract {
        headers: table.headers,
        rows,
        padded_rows: table.padded_rows,
        preamble_lines: table.preamble_lines,
    })
}

#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_extract_path<P: AsRef<Path>>(path: P) -> Result<Extract> {
    let file = File::open(&path)?;
    let extract = read_extract(file)?;
    info!(rows = extract.rows.len(), "read enrollment extract");
    Ok(extract)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{feff}QCCV_SR_CLASS_ENRL_LOC_TIME_RD\n\
Institution,Term,Session,Subject Area,Catalog Nbr,Class Title,Class Nbr,Class Section,Class Status,Course Component,Enrollment Total,Enrollment Capacity,Room,Mon,Tues,Wed,Thurs,Fri,Sat,Sun,Mtg Start,Mtg End,Instruction Mode,Instructor,Role,Attributes,Fees Exist?,Sysdate\n\
QNS01,1209,1,ENGL,110,College Writing 1,12345,01,Active,LEC,24,25,KY 101,Y,N,Y,N,N,N,N,9:15:00.000000 AM,10:30:00.000000 AM,P,\"Doe,Jane\",PI,,N,9/5/20\n\
QNS01,1209,1,ENGL,110,College Writing 1,12346,02,Active,LEC,20,25\n";

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header("Class Nbr"), "class_nbr");
        assert_eq!(normalize_header("\u{feff}Institution"), "institution");
        assert_eq!(normalize_header("Fees Exist?"), "fees_exist");
        assert_eq!(normalize_header("Class #"), "class_num");
    }

    #[test]
    fn reads_sample_extract() {
        let extract = read_extract(SAMPLE.as_bytes()).unwrap();
        assert_eq!(extract.preamble_lines, 1);
        assert_eq!(extract.headers[0], "Institution");
        assert_eq!(extract.rows.len(), 2);
        assert_eq!(extract.padded_rows, 1);

        let first = &extract.rows[0];
        assert_eq!(first.course(), "ENGL 110");
        assert_eq!(first.class_number, "12345");
        assert_eq!(first.instructor, "Doe,Jane");
        assert_eq!(
            first.meeting_days,
            [true, false, true, false, false, false, false]
        );
        assert_eq!(first.fees, "N");
        assert_eq!(first.sysdate, "9/5/20");

        let short = &extract.rows[1];
        assert_eq!(short.limit, "25");
        assert_eq!(short.room, "");
        assert_eq!(short.instructor, "");
    }

    #[test]
    fn missing_header_row_is_an_error() {
        let err = read_extract("a,b,c\n1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MissingHeader(_)));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = read_extract("Institution,Term\nQNS01,1209\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "session"));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut bytes = SAMPLE.as_bytes().to_vec();
        let pos = SAMPLE.find("College Writing 1,12345").unwrap();
        bytes[pos] = 0xff;
        let extract = read_extract(bytes.as_slice()).unwrap();
        assert!(extract.rows[0].title.starts_with('\u{fffd}'));
    }
}
