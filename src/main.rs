use core::error;

use chrono::Local;
use tracing::info;
use utils::write_to_csv;

mod config;
mod data;
mod utils;

use data::status_invest::StatusInvestClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = config::Settings::new().expect("Failed to load configuration");
    let minimum_date = utils::parse_date(&settings.general.minimum_date)?;

    let client = StatusInvestClient::new();
    let table = data::aggregate_prices(&settings.assets, &client, minimum_date).await?;

    let mut asset_names: Vec<String> = settings.assets.iter().map(|a| a.name.clone()).collect();
    asset_names.sort();

    let today = Local::now().format("%Y-%m-%d").to_string();
    let output_path = format!(
        "{}/status-invest-asset-prices-{}.csv",
        settings.general.output_dir, today
    );
    write_to_csv(&table, &asset_names, &output_path)?;

    info!(
        "Wrote {} dates for {} assets to {}",
        table.len(),
        asset_names.len(),
        output_path
    );
    Ok(())
}
