use chrono::{FixedOffset, NaiveDate};
use csv::QuoteStyle;
use thiserror::Error;

use crate::history::HistoryStats;
use crate::models::TourRecord;

const BOM: &str = "\u{FEFF}";

pub const DETAIL_HEADER: [&str; 6] = ["Tour Name", "Date", "Status", "Stops", "Duration", "Distance (km)"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no tours to export")]
    Empty,
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv output is not utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Download name for a report generated on `date`.
pub fn report_file_name(date: NaiveDate) -> String {
    format!("Travel_Report_{}.csv", date.format("%Y-%m-%d"))
}

/// Render the tour history as a CSV report: a summary block followed by one
/// row per tour. The output starts with a UTF-8 byte-order mark.
///
/// Tour dates are written as calendar days at `offset`, the reader's local
/// time zone.
pub fn export_csv(
    tours: &[TourRecord],
    generated_on: NaiveDate,
    offset: FixedOffset,
) -> Result<String, ReportError> {
    if tours.is_empty() {
        return Err(ReportError::Empty);
    }
    let stats = HistoryStats::from_tours(tours);

    let header = write_rows(
        &[
            vec!["FOOD TOUR REPORT".to_string()],
            vec!["Generated on".to_string(), vi_date(generated_on)],
        ],
        QuoteStyle::Necessary,
    )?;

    let summary = write_rows(
        &[
            vec!["SUMMARY STATISTICS".to_string()],
            vec!["Total Tours Completed".to_string(), stats.tours.to_string()],
            vec!["Total Restaurants Visited".to_string(), stats.restaurants.to_string()],
            vec!["Total Dishes Tried".to_string(), stats.dishes.to_string()],
            vec![
                "Total Distance Traveled".to_string(),
                format!("{:.1} km", stats.distance_km),
            ],
        ],
        QuoteStyle::Necessary,
    )?;

    let detail_head = write_rows(
        &[
            vec!["DETAILED TOUR LOG".to_string()],
            DETAIL_HEADER.iter().map(|s| s.to_string()).collect(),
        ],
        QuoteStyle::Necessary,
    )?;
    // Tour rows are always quoted so spreadsheet apps never split a name.
    let rows: Vec<Vec<String>> = tours.iter().map(|t| detail_row(t, offset)).collect();
    let detail = write_rows(&rows, QuoteStyle::Always)?;

    Ok(format!("{BOM}{header}\n{summary}\n{detail_head}{detail}"))
}

fn detail_row(tour: &TourRecord, offset: FixedOffset) -> Vec<String> {
    let name = if tour.name.is_empty() {
        "Unnamed Tour".to_string()
    } else {
        tour.name.clone()
    };
    let duration = if tour.duration.is_empty() {
        "Flexible".to_string()
    } else {
        tour.duration.clone()
    };
    vec![
        name,
        vi_date(tour.date.with_timezone(&offset).date_naive()),
        tour.status.label().to_string(),
        tour.stops.len().to_string(),
        duration,
        format!("{:.1}", tour.distance_km()),
    ]
}

/// Day/month/year without zero padding, e.g. "5/3/2026".
fn vi_date(date: NaiveDate) -> String {
    date.format("%-d/%-m/%Y").to_string()
}

fn write_rows(rows: &[Vec<String>], style: QuoteStyle) -> Result<String, ReportError> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(style)
        .from_writer(Vec::new());
    for row in rows {
        wtr.write_record(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
