//! Module command - show one catalogue entry.

use crate::catalogue::{module_level, CatalogueClient};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the module command.
pub async fn run_module(code: &str, year: Option<&str>, settings: Settings) -> Result<()> {
    let client = CatalogueClient::new(&settings.catalogue)?;

    let spinner = Output::spinner("Fetching module...");
    let entry = client.get_entry(code, year).await;
    spinner.finish_and_clear();

    let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    Output::header(&format!("{} {}", entry.module_code, entry.title));
    Output::kv("Academic year", year.unwrap_or(client.default_year()));
    if let Some(credit) = &entry.module_credit {
        Output::kv("Units", credit);
    }
    if let Some(level) = module_level(&entry.module_code) {
        Output::kv("Level", &format!("{}000", level));
    }
    if let Some(faculty) = &entry.faculty {
        Output::kv("Faculty", faculty);
    }
    if let Some(department) = &entry.department {
        Output::kv("Department", department);
    }

    let semesters = entry
        .semester_data
        .iter()
        .map(|s| s.semester.to_string())
        .collect::<Vec<_>>();
    if !semesters.is_empty() {
        Output::kv("Semesters", &semesters.join(", "));
    }

    if let Some(description) = &entry.description {
        println!("\n{}", description);
    }

    Output::header("Requirements");
    Output::kv("Prerequisite", entry.prerequisite.as_deref().unwrap_or("None"));
    Output::kv("Preclusion", entry.preclusion.as_deref().unwrap_or("None"));
    Output::kv("Corequisite", entry.corequisite.as_deref().unwrap_or("None"));

    if !entry.fulfill_requirements.is_empty() {
        Output::header("Unlocks");
        for code in &entry.fulfill_requirements {
            Output::list_item(code);
        }
    }
    println!();

    Ok(())
}
