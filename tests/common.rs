#![allow(dead_code)]

use cycle_calendar_service::db::create_pool;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use sqlx::SqlitePool;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Fresh migrated in-memory database (single connection, so every query sees the same data)
pub async fn setup_test_db() -> SqlitePool {
    create_pool("sqlite::memory:", 1)
        .await
        .expect("Failed to create test database")
}

/// A fixture cell written into a generated xlsx file
#[derive(Debug, Clone)]
pub enum Cell {
    Text(&'static str),
    Number(f64),
    /// Real spreadsheet date (date-formatted serial)
    Date(u16, u8, u8),
    Blank,
}

pub use Cell::{Blank, Date, Number, Text};

/// Build xlsx bytes from (sheet name, rows) pairs
pub fn xlsx_bytes(sheets: &[(&str, Vec<Vec<Cell>>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("Failed to name worksheet");

        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match cell {
                    Text(s) => {
                        worksheet.write_string(r, c, *s).expect("write string");
                    }
                    Number(n) => {
                        worksheet.write_number(r, c, *n).expect("write number");
                    }
                    Date(y, m, d) => {
                        let date = ExcelDateTime::from_ymd(*y, *m, *d).expect("valid date");
                        worksheet
                            .write_datetime_with_format(r, c, &date, &date_format)
                            .expect("write date");
                    }
                    Blank => {}
                }
            }
        }
    }

    workbook.save_to_buffer().expect("Failed to build xlsx fixture")
}

/// Typical client calendar: title rows, header at row 3, a few days
pub fn sample_calendar_rows() -> Vec<Vec<Cell>> {
    vec![
        vec![Text("ACME Water Utility")],
        vec![Text("2024 Cycle Calendar")],
        vec![Text("Prepared by billing")],
        vec![Text("Cycle"), Text("Zone"), Blank, Text("Cycle Date"), Text("Type")],
        vec![Number(1.0), Number(2.0), Blank, Date(2024, 1, 5), Text("R")],
        vec![Number(1.0), Number(3.0), Blank, Date(2024, 1, 6), Text("W")],
        vec![Number(2.0), Number(1.0), Blank, Date(2024, 2, 19), Text("H")],
        vec![Number(2.0), Number(2.0), Blank, Date(2024, 2, 20), Text("R")],
    ]
}

pub fn sample_calendar_bytes() -> Vec<u8> {
    xlsx_bytes(&[("Cycle Calendar", sample_calendar_rows())])
}

/// Replace one worksheet's XML inside xlsx bytes with a cell calamine refuses to decode
///
/// `sheet_number` is 1-based in workbook order, matching `xl/worksheets/sheetN.xml`.
pub fn corrupt_worksheet(xlsx: &[u8], sheet_number: usize) -> Vec<u8> {
    let target = format!("xl/worksheets/sheet{sheet_number}.xml");
    let broken = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="e"><v>#BOGUS</v></c></row></sheetData></worksheet>"#;

    let mut archive = ZipArchive::new(Cursor::new(xlsx)).expect("fixture is a zip archive");
    let mut buf = Vec::new();
    {
        let mut writer = ZipWriter::new(Cursor::new(&mut buf));
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).expect("read zip entry");
            let name = entry.name().to_string();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).expect("read zip entry body");

            writer
                .start_file(name.as_str(), SimpleFileOptions::default())
                .expect("start zip entry");
            if name == target {
                writer.write_all(broken.as_bytes()).expect("write zip entry");
            } else {
                writer.write_all(&content).expect("write zip entry");
            }
        }
        writer.finish().expect("finish zip");
    }
    buf
}
