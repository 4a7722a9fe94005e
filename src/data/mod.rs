pub mod status_invest;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Asset;

use self::status_invest::AssetResource;

/// A single normalized price observation. `date` carries the provider's
/// `DD/MM/YY` text; the aggregation pass parses and re-keys it.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub price: f64,
    pub date: String,
}

/// Date -> asset name -> price. `BTreeMap` keeps rows in chronological order
/// for the export pass.
pub type AggregateTable = BTreeMap<NaiveDate, HashMap<String, f64>>;

#[derive(Error, Debug)]
pub enum PriceError {
    #[error("Unsupported asset kind `{0}`")]
    UnsupportedAssetKind(String),
    #[error("Unrecognized price response shape")]
    UnrecognizedResponse,
    #[error("Invalid price date `{0}`")]
    InvalidPriceDate(String),
    #[error("Price request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Seam between the aggregation pass and the HTTP transport.
#[async_trait]
pub trait FetchPrices {
    async fn fetch_prices(&self, resource: &AssetResource) -> Result<Value, PriceError>;
}

/// Fetches every asset's price series in list order and folds the surviving
/// points into one date-keyed table. Points dated before `minimum_date` are
/// dropped; the cutoff date itself is kept. The first failure aborts the
/// whole pass.
pub async fn aggregate_prices(
    assets: &[Asset],
    source: &impl FetchPrices,
    minimum_date: NaiveDate,
) -> Result<AggregateTable, PriceError> {
    let mut table = AggregateTable::new();

    for asset in assets {
        let resource = status_invest::asset_resource(asset)?;
        let raw = source.fetch_prices(&resource).await?;
        let points = status_invest::parse_asset_prices(&raw)?;
        info!("Fetched {} price points for {}", points.len(), asset.name);

        let mut kept = 0;
        for point in points {
            let raw_date = point.date.trim();
            let date = NaiveDate::parse_from_str(raw_date, "%d/%m/%y")
                .map_err(|_| PriceError::InvalidPriceDate(raw_date.to_string()))?;
            if date < minimum_date {
                continue;
            }

            table
                .entry(date)
                .or_default()
                .insert(asset.name.clone(), point.price);
            kept += 1;
        }
        debug!("Kept {} points for {} after {} cutoff", kept, asset.name, minimum_date);
    }

    Ok(table)
}
