//! Text rendering of the record list.

use chrono::NaiveDateTime;
use licsync_codec::Record;
use licsync_sync_engine::RenderSurface;

const HEADERS: [&str; 5] = ["#", "DEVICE_HASH", "USER", "EXPIRY", "STATUS"];

/// Formats `rows` as an aligned table. Each row is (index, record).
pub fn table<'a>(rows: impl IntoIterator<Item = (usize, &'a Record)>, now: NaiveDateTime) -> String {
    let cells: Vec<[String; 5]> = rows
        .into_iter()
        .map(|(index, record)| {
            [
                index.to_string(),
                record.device_hash.clone(),
                record.user.clone().unwrap_or_default(),
                record.expiry.clone().unwrap_or_default(),
                record.expiry_status(now).to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, row: &[String; 5], widths: &[usize; 5]) {
    let line = row
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Current UTC time, the clock expiry values are written in.
pub fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Prints the full table on every engine render.
#[derive(Debug, Default)]
pub struct TableSurface;

impl RenderSurface for TableSurface {
    fn render(&self, records: &[Record]) {
        print!("{}", table(records.iter().enumerate(), now()));
    }
}
