use anyhow::Result;
use services::AppServices;

use crate::views::print_json;

pub async fn init(app: &AppServices) -> Result<()> {
    print_json(&app.stats().init().await?)
}

pub async fn overview(app: &AppServices) -> Result<()> {
    print_json(&app.stats().overview().await?)
}

pub async fn history(app: &AppServices, limit: Option<u32>) -> Result<()> {
    print_json(&app.stats().history(limit).await?)
}
