/// Default data loaded into an empty store at startup
use crate::error::Result;
use crate::models::Company;
use crate::services::CompanyService;

pub const DEFAULT_OWNER: &str = "default@admin.com";
pub const DEFAULT_COMPANIES: [&str; 3] = ["Facebook", "Google", "Twitter"];

/// Seed the default companies unless the store already holds any record.
///
/// Returns how many companies were inserted.
pub async fn seed_default_companies(service: &CompanyService) -> Result<usize> {
    let existing = service.count().await?;
    if existing > 0 {
        tracing::info!(existing, "Skipping initial load; companies already present");
        return Ok(0);
    }

    let seeds = DEFAULT_COMPANIES
        .iter()
        .map(|name| Company::new(*name, DEFAULT_OWNER))
        .collect();
    let saved = service.save_all(seeds).await?;

    tracing::info!(count = saved.len(), owner = DEFAULT_OWNER, "Loaded default companies");
    Ok(saved.len())
}
