use garden_core::advisor::catalog::Catalog;
use garden_core::config::{AppConfig, LoadOptions};
use garden_core::domain::item::{ItemSource, Tier};
use serde::Serialize;

use crate::commands::CommandResult;

const COMMAND: &str = "catalog";

#[derive(Debug, Serialize)]
struct CatalogRow<'a> {
    id: u32,
    name: &'a str,
    display_name: &'a str,
    source: &'static str,
    tier: &'static str,
    sell_price: u64,
    multi_harvest: bool,
}

pub fn run(source: Option<&str>, tier: Option<&str>) -> CommandResult {
    let source = match source.map(|raw| (raw, ItemSource::parse(raw))) {
        Some((_, Some(source))) => Some(source),
        Some((raw, None)) => {
            return CommandResult::failure(
                COMMAND,
                "validation_error",
                format!("source must be crop or pet, got `{raw}`"),
                1,
            );
        }
        None => None,
    };
    let tier = match tier.map(|raw| (raw, Tier::parse(raw))) {
        Some((_, Some(tier))) => Some(tier),
        Some((raw, None)) => {
            return CommandResult::failure(
                COMMAND,
                "validation_error",
                format!("unknown tier `{raw}`"),
                1,
            );
        }
        None => None,
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2),
    };
    let catalog = match Catalog::load_or_builtin(config.catalog.path.as_deref()) {
        Ok(catalog) => catalog,
        Err(error) => return CommandResult::failure(COMMAND, "catalog", error.to_string(), 2),
    };

    let rows = catalog
        .filter(source, tier)
        .into_iter()
        .map(|item| CatalogRow {
            id: item.id.0,
            name: &item.name,
            display_name: &item.display_name,
            source: item.source.as_str(),
            tier: item.tier.as_str(),
            sell_price: item.sell_price,
            multi_harvest: item.multi_harvest,
        })
        .collect::<Vec<_>>();

    CommandResult::success_with_data(
        COMMAND,
        format!("{} of {} item(s) listed", rows.len(), catalog.len()),
        serde_json::to_value(&rows).ok(),
    )
}
