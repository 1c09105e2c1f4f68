//! Capability descriptors handed to the planning model.

use serde::Serialize;
use serde_json::{json, Value};

/// Name, purpose, argument schema and return shape of one capability.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: Value,
    /// Natural-language description of the output shape.
    pub returns: String,
}

impl CapabilityDescriptor {
    /// Description including the return shape, for planners that only take one text field.
    pub fn planner_description(&self) -> String {
        format!("{}\n\nReturns: {}", self.description, self.returns)
    }
}

/// The fixed set of capabilities, built once at startup.
#[derive(Debug, Clone)]
pub struct CapabilitySet {
    descriptors: Vec<CapabilityDescriptor>,
}

impl CapabilitySet {
    /// The four catalogue capabilities.
    pub fn standard(default_lessons: usize) -> Self {
        let acad_year = json!({
            "type": "string",
            "description": "Academic year in YYYY-YYYY format (for example 2024-2025). Omit for the current year."
        });
        let module_code = json!({
            "type": "string",
            "description": "Module code, for example CS2040"
        });

        let descriptors = vec![
            CapabilityDescriptor {
                name: "module_overview".to_string(),
                description: "Retrieve the canonical record of a module for course planning \
                    questions: title, description, credits, faculty and department."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "module_code": module_code,
                        "acad_year": acad_year
                    },
                    "required": ["module_code"]
                }),
                returns: "moduleCode, title, description, moduleCredit, faculty, department, \
                    prerequisite, preclusion and fulfillRequirements. No timetable data."
                    .to_string(),
            },
            CapabilityDescriptor {
                name: "module_prerequisites".to_string(),
                description: "Surface prerequisite, preclusion, corequisite and fulfilment data \
                    for a module."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "module_code": module_code,
                        "acad_year": acad_year
                    },
                    "required": ["module_code"]
                }),
                returns: "moduleCode, title, prerequisite (text), prerequisiteTree (nested and/or \
                    structure), fulfillRequirements, preclusion and corequisite."
                    .to_string(),
            },
            CapabilityDescriptor {
                name: "module_timetable".to_string(),
                description: "Summarise the timetable of a module across semesters and lesson \
                    groupings."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "module_code": module_code,
                        "acad_year": acad_year,
                        "semester": {
                            "type": "integer",
                            "description": "Semester number: 1 or 2 (3 and 4 are special terms). Omit for all semesters."
                        },
                        "limit_lessons": {
                            "type": "integer",
                            "description": format!("Maximum lessons listed per semester (default: {})", default_lessons),
                            "default": default_lessons
                        }
                    },
                    "required": ["module_code"]
                }),
                returns: "moduleCode, acadYear and semesterData: a list of {semester, examDate, \
                    lessons}, each lesson with classNo, lessonType, day, startTime, endTime, \
                    venue, weeks and staff."
                    .to_string(),
            },
            CapabilityDescriptor {
                name: "module_search".to_string(),
                description: "Locate modules by keyword in their code or title, optionally \
                    filtered by level (the first digit of the code number, e.g. 2 for CS2040)."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Keyword to match against module codes and titles"
                        },
                        "acad_year": acad_year,
                        "level": {
                            "type": "integer",
                            "description": "Module level digit, for example 4 for 4000-level modules"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of results (default: 10, at most 50)",
                            "default": 10
                        }
                    },
                    "required": ["query"]
                }),
                returns: "query, acadYear, count and results: a list of {moduleCode, title, \
                    semesters} in catalogue order."
                    .to_string(),
            },
        ];

        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[CapabilityDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
