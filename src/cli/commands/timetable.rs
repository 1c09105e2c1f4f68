//! Timetable command implementation.

use crate::catalogue::CatalogueClient;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the timetable command.
pub async fn run_timetable(
    code: &str,
    semester: Option<u8>,
    year: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let client = CatalogueClient::new(&settings.catalogue)?;

    let spinner = Output::spinner("Fetching timetable...");
    let schedule = client.get_schedule(code, year, semester).await;
    spinner.finish_and_clear();

    let schedule = match schedule {
        Ok(schedule) => schedule,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    if schedule.is_empty() {
        match semester {
            Some(s) => Output::warning(&format!("{} is not offered in semester {}.", code, s)),
            None => Output::warning(&format!("{} has no timetable data.", code)),
        }
        return Ok(());
    }

    for sem in &schedule {
        Output::header(&format!("Semester {}", sem.semester));
        if let Some(exam) = &sem.exam_date {
            Output::kv("Exam", exam);
        }
        if sem.timetable.is_empty() {
            Output::list_item("No lessons listed");
        }
        for block in &sem.timetable {
            Output::lesson(block);
        }
    }
    println!();

    Ok(())
}
