//! Search command implementation.

use crate::catalogue::CatalogueClient;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    level: Option<u8>,
    limit: usize,
    year: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let client = CatalogueClient::new(&settings.catalogue)?;

    let spinner = Output::spinner("Searching module list...");
    let results = client.search_entries(query, year, level, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(matches) => {
            if matches.is_empty() {
                Output::warning("No modules found matching your query.");
            } else {
                Output::success(&format!("Found {} modules", matches.len()));
                for summary in &matches {
                    Output::module_summary(summary);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
