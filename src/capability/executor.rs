//! Runs capabilities against the catalogue client.

use super::tools::{parse_capability, Capability, CapabilityRequest, CapabilityResult};
use crate::catalogue::CatalogueClient;
use crate::error::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Capability execution context with access to the shared catalogue client.
#[derive(Clone)]
pub struct CapabilityExecutor {
    catalogue: Arc<CatalogueClient>,
    default_lessons: usize,
}

impl CapabilityExecutor {
    pub fn new(catalogue: Arc<CatalogueClient>, default_lessons: usize) -> Self {
        Self {
            catalogue,
            default_lessons,
        }
    }

    pub fn catalogue(&self) -> &Arc<CatalogueClient> {
        &self.catalogue
    }

    /// Parse and run a planner request. Failures become error results, never `Err`.
    pub async fn invoke(&self, request: &CapabilityRequest) -> CapabilityResult {
        info!("Calling capability: {} with args: {}", request.name, request.arguments);

        let outcome = match parse_capability(request) {
            Ok(capability) => self.execute(&capability).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(output) => CapabilityResult::success(request, output),
            Err(e) => {
                warn!("Capability {} failed: {}", request.name, e);
                CapabilityResult::failure(request, &e)
            }
        }
    }

    /// Execute a typed capability and return its JSON output.
    pub async fn execute(&self, capability: &Capability) -> Result<Value> {
        match capability {
            Capability::ModuleOverview {
                module_code,
                acad_year,
            } => self.overview(module_code, acad_year.as_deref()).await,
            Capability::ModulePrerequisites {
                module_code,
                acad_year,
            } => self.prerequisites(module_code, acad_year.as_deref()).await,
            Capability::ModuleTimetable {
                module_code,
                acad_year,
                semester,
                limit_lessons,
            } => {
                self.timetable(module_code, acad_year.as_deref(), *semester, *limit_lessons)
                    .await
            }
            Capability::ModuleSearch {
                query,
                acad_year,
                level,
                limit,
            } => self.search(query, acad_year.as_deref(), *level, *limit).await,
        }
    }

    async fn overview(&self, module_code: &str, acad_year: Option<&str>) -> Result<Value> {
        let entry = self.catalogue.get_entry(module_code, acad_year).await?;

        Ok(json!({
            "moduleCode": entry.module_code,
            "title": entry.title,
            "description": entry.description,
            "moduleCredit": entry.module_credit,
            "faculty": entry.faculty,
            "department": entry.department,
            "prerequisite": entry.prerequisite,
            "preclusion": entry.preclusion,
            "fulfillRequirements": entry.fulfill_requirements,
        }))
    }

    async fn prerequisites(&self, module_code: &str, acad_year: Option<&str>) -> Result<Value> {
        let entry = self.catalogue.get_entry(module_code, acad_year).await?;

        Ok(json!({
            "moduleCode": entry.module_code,
            "title": entry.title,
            "prerequisite": entry.prerequisite,
            "prerequisiteTree": entry.prerequisite_tree,
            "fulfillRequirements": entry.fulfill_requirements,
            "preclusion": entry.preclusion,
            "corequisite": entry.corequisite,
        }))
    }

    async fn timetable(
        &self,
        module_code: &str,
        acad_year: Option<&str>,
        semester: Option<u8>,
        limit_lessons: Option<usize>,
    ) -> Result<Value> {
        let semesters = self
            .catalogue
            .get_schedule(module_code, acad_year, semester)
            .await?;
        let limit = limit_lessons.unwrap_or(self.default_lessons);

        let shaped = semesters
            .iter()
            .map(|sem| {
                let lessons = sem.timetable.iter().take(limit).collect::<Vec<_>>();
                json!({
                    "semester": sem.semester,
                    "examDate": sem.exam_date,
                    "lessonCount": sem.timetable.len(),
                    "lessons": lessons,
                })
            })
            .collect::<Vec<_>>();

        Ok(json!({
            "moduleCode": module_code,
            "acadYear": acad_year.unwrap_or(self.catalogue.default_year()),
            "semesterData": shaped,
        }))
    }

    async fn search(
        &self,
        query: &str,
        acad_year: Option<&str>,
        level: Option<u8>,
        limit: usize,
    ) -> Result<Value> {
        let matches = self
            .catalogue
            .search_entries(query, acad_year, level, limit)
            .await?;

        Ok(json!({
            "query": query,
            "acadYear": acad_year.unwrap_or(self.catalogue.default_year()),
            "count": matches.len(),
            "results": matches,
        }))
    }
}
