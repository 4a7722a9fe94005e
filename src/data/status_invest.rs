use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Asset;

use super::{FetchPrices, PriceError, PricePoint};

const BOND_PRICE_URL: &str = "https://statusinvest.com.br/category/bondprice";
const ETF_PRICE_URL: &str = "https://statusinvest.com.br/etf/tickerprice";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

const USER_AGENT_LIST: [&str; 3] = [
    "Mozilla/5.0 (iPad; CPU OS 12_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.83 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.51 Safari/537.36",
];

/// Request target for one asset: endpoint plus form-encoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetResource {
    pub url: String,
    pub params: Vec<(String, String)>,
}

/// Maps an asset to the endpoint and payload its prices are served from.
/// This match is the single place new asset kinds get wired up.
pub fn asset_resource(asset: &Asset) -> Result<AssetResource, PriceError> {
    match asset.kind.to_lowercase().as_str() {
        "bond" => Ok(AssetResource {
            url: BOND_PRICE_URL.to_string(),
            params: vec![
                ("ticker".to_string(), asset.ticker.clone()),
                ("type".to_string(), "4".to_string()),
            ],
        }),
        "etf" => Ok(AssetResource {
            url: ETF_PRICE_URL.to_string(),
            params: vec![
                ("ticker".to_string(), asset.ticker.clone()),
                ("type".to_string(), "4".to_string()),
                ("currencies[]".to_string(), "1".to_string()),
            ],
        }),
        _ => Err(PriceError::UnsupportedAssetKind(asset.kind.clone())),
    }
}

#[derive(Debug, Deserialize)]
struct BondPrice {
    sellprice: f64,
    date: String,
}

#[derive(Debug, Deserialize)]
struct EtfPriceSeries {
    prices: Vec<EtfPrice>,
}

#[derive(Debug, Deserialize)]
struct EtfPrice {
    price: f64,
    date: String,
}

enum PriceResponse {
    Bond(Vec<BondPrice>),
    Etf(EtfPriceSeries),
}

/// Decides which of the two known payload layouts `raw` uses, then decodes
/// the matched one. The bond check runs first: an empty array is a valid
/// bond series with no points, while the ETF layout requires at least one
/// entry.
fn classify_response(raw: &Value) -> Result<PriceResponse, PriceError> {
    let items = raw.as_array().ok_or(PriceError::UnrecognizedResponse)?;

    let first = match items.first() {
        None => return Ok(PriceResponse::Bond(Vec::new())),
        Some(first) => first,
    };

    if first.get("sellprice").is_some() {
        let entries = serde_json::from_value(raw.clone())
            .map_err(|_| PriceError::UnrecognizedResponse)?;
        return Ok(PriceResponse::Bond(entries));
    }

    if first.get("prices").is_some() {
        let series = serde_json::from_value(first.clone())
            .map_err(|_| PriceError::UnrecognizedResponse)?;
        return Ok(PriceResponse::Etf(series));
    }

    Err(PriceError::UnrecognizedResponse)
}

/// Normalizes a raw price payload into `{price, date}` points.
///
/// Bond entries pass their values through in input order. ETF payloads group
/// prices per currency; only the first group is relevant, and its dates carry
/// a time-of-day suffix that gets stripped here.
pub fn parse_asset_prices(raw: &Value) -> Result<Vec<PricePoint>, PriceError> {
    let points = match classify_response(raw)? {
        PriceResponse::Bond(entries) => entries
            .into_iter()
            .map(|entry| PricePoint {
                price: entry.sellprice,
                date: entry.date,
            })
            .collect(),
        PriceResponse::Etf(series) => series
            .prices
            .into_iter()
            .map(|entry| PricePoint {
                price: entry.price,
                date: entry
                    .date
                    .split(' ')
                    .next()
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect(),
    };

    Ok(points)
}

/// Status Invest price endpoint client.
#[derive(Default)]
pub struct StatusInvestClient {
    client: reqwest::Client,
}

impl StatusInvestClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl FetchPrices for StatusInvestClient {
    async fn fetch_prices(&self, resource: &AssetResource) -> Result<Value, PriceError> {
        let response = self
            .client
            .post(&resource.url)
            .form(&resource.params)
            .header(USER_AGENT, user_agent())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .send()
            .await?;

        let json_val: Value = response.json().await?;
        Ok(json_val)
    }
}

/// Picks a browser User-Agent per request so repeated runs do not present a
/// constant client signature.
fn user_agent() -> &'static str {
    USER_AGENT_LIST
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENT_LIST[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asset(ticker: &str, kind: &str) -> Asset {
        Asset {
            name: ticker.to_string(),
            ticker: ticker.to_string(),
            kind: kind.to_string(),
        }
    }

    #[test]
    fn bond_resource_targets_the_bond_endpoint() {
        let resource = asset_resource(&asset("CDBA", "bond")).unwrap();

        assert_eq!(resource.url, BOND_PRICE_URL);
        assert_eq!(
            resource.params,
            vec![
                ("ticker".to_string(), "CDBA".to_string()),
                ("type".to_string(), "4".to_string()),
            ]
        );
    }

    #[test]
    fn etf_resource_adds_the_currency_param() {
        let resource = asset_resource(&asset("BOVA11", "etf")).unwrap();

        assert_eq!(resource.url, ETF_PRICE_URL);
        assert_eq!(
            resource.params,
            vec![
                ("ticker".to_string(), "BOVA11".to_string()),
                ("type".to_string(), "4".to_string()),
                ("currencies[]".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn resource_kind_match_is_case_insensitive() {
        assert!(asset_resource(&asset("CDBA", "Bond")).is_ok());
        assert!(asset_resource(&asset("BOVA11", "ETF")).is_ok());
    }

    #[test]
    fn unknown_kind_is_rejected_before_any_request() {
        let result = asset_resource(&asset("PETR4", "stock"));

        assert!(matches!(
            result,
            Err(PriceError::UnsupportedAssetKind(kind)) if kind == "stock"
        ));
    }

    #[test]
    fn empty_array_is_a_bond_series_with_no_points() {
        let points = parse_asset_prices(&json!([])).unwrap();

        assert!(points.is_empty());
    }

    #[test]
    fn bond_points_keep_input_order_and_values() {
        let raw = json!([
            { "sellprice": 102.5, "date": "01/06/21" },
            { "sellprice": 103.0, "date": "02/06/21" },
            { "sellprice": 101.9, "date": "03/06/21" }
        ]);

        let points = parse_asset_prices(&raw).unwrap();

        assert_eq!(
            points,
            vec![
                PricePoint { price: 102.5, date: "01/06/21".to_string() },
                PricePoint { price: 103.0, date: "02/06/21".to_string() },
                PricePoint { price: 101.9, date: "03/06/21".to_string() },
            ]
        );
    }

    #[test]
    fn etf_points_come_from_the_first_group_only() {
        let raw = json!([
            { "prices": [
                { "price": 10.5, "date": "01/06/21 18:00:00" },
                { "price": 10.7, "date": "02/06/21 18:00:00" }
            ]},
            { "prices": [
                { "price": 99.9, "date": "01/06/21 18:00:00" }
            ]}
        ]);

        let points = parse_asset_prices(&raw).unwrap();

        assert_eq!(
            points,
            vec![
                PricePoint { price: 10.5, date: "01/06/21".to_string() },
                PricePoint { price: 10.7, date: "02/06/21".to_string() },
            ]
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = json!([
            { "prices": [{ "price": 10.5, "date": "01/06/21 18:00:00" }] }
        ]);

        assert_eq!(
            parse_asset_prices(&raw).unwrap(),
            parse_asset_prices(&raw).unwrap()
        );
    }

    #[test]
    fn bare_object_is_an_unrecognized_shape() {
        let result = parse_asset_prices(&json!({}));

        assert!(matches!(result, Err(PriceError::UnrecognizedResponse)));
    }

    #[test]
    fn array_with_neither_field_is_an_unrecognized_shape() {
        let result = parse_asset_prices(&json!([{ "close": 10.0 }]));

        assert!(matches!(result, Err(PriceError::UnrecognizedResponse)));
    }
}
