use std::{error::Error, fs, io, path::Path};

use chrono::{NaiveDate, ParseError};
use csv::WriterBuilder;

use crate::data::AggregateTable;

pub fn parse_date(date_str: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Renders a price with a decimal comma for the spreadsheet locale the
/// output is imported into.
pub fn format_price(price: f64) -> String {
    price.to_string().replace('.', ",")
}

/// Writes the date x asset grid as CSV. `asset_names` supplies the column
/// order and is expected to be sorted by the caller.
pub fn write_table<W: io::Write>(
    table: &AggregateTable,
    asset_names: &[String],
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let mut header = vec!["Date".to_string()];
    header.extend(asset_names.iter().cloned());
    wtr.write_record(&header)?;

    for (date, prices) in table {
        let mut row = vec![date.format("%d/%m/%Y").to_string()];
        for asset in asset_names {
            // If no price found, leave the cell blank.
            match prices.get(asset) {
                Some(price) => row.push(format_price(*price)),
                None => row.push(String::new()),
            }
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the grid to `output_path`, creating parent directories as needed.
/// A leftover file from an earlier run of the same day is overwritten.
pub fn write_to_csv(
    table: &AggregateTable,
    asset_names: &[String],
    output_path: &str,
) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = Path::new(output_path).parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(output_path)?;
    write_table(table, asset_names, file)?;
    Ok(())
}
