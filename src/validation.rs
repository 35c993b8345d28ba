//! Request validation.
//!
//! Wire DTOs here are deliberately loose: every field is an optional raw JSON
//! value, so a wrong type (`"year": 2025`) lands in the per-field report
//! instead of failing the whole body in serde. Only syntactically broken JSON
//! is rejected before `validate()` runs. `validate()` turns the DTOs into the
//! strict core types.

use serde::Deserialize;
use serde_json::Value;

use crate::document::docx::is_xml_char;
use crate::error::{DiplomError, Result, ValidationReport};
use crate::model::ItemKind;
use crate::outline::Profile;

pub const TOPIC_CHARS: (usize, usize) = (3, 240);

/// Body of the outline generation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: Option<Value>,
}

impl GenerateRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(Value::String(topic.into())),
        }
    }

    /// Returns the topic exactly as sent; only its length and characters are
    /// checked.
    pub fn validate(self) -> Result<String> {
        let mut report = ValidationReport::default();
        let topic = string_field(&mut report, "topic", self.topic);
        if let Some(topic) = &topic {
            check_text(&mut report, "topic", topic, TOPIC_CHARS);
        }
        report.into_result()?;
        Ok(topic.unwrap_or_default())
    }
}

/// Body of the rephrase/replace requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemRequest {
    #[serde(default, rename = "type")]
    pub kind: Option<Value>,
}

impl ItemRequest {
    pub fn validate(self) -> Result<ItemKind> {
        let mut report = ValidationReport::default();
        let kind = string_field(&mut report, "type", self.kind);
        report.into_result()?;
        match kind {
            Some(kind) => kind.parse(),
            None => Err(DiplomError::invalid("type", "field required")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlePageInput {
    #[serde(default)]
    pub university: Option<Value>,
    #[serde(default)]
    pub faculty: Option<Value>,
    #[serde(default)]
    pub department: Option<Value>,
    #[serde(default, alias = "work_title")]
    pub work_title: Option<Value>,
    #[serde(default, alias = "student_name")]
    pub student_name: Option<Value>,
    #[serde(default, alias = "supervisor_name")]
    pub supervisor_name: Option<Value>,
    #[serde(default)]
    pub city: Option<Value>,
    #[serde(default)]
    pub year: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentInput {
    #[serde(default)]
    pub profile: Option<Value>,
    /// Expected to be an object shaped like [`TitlePageInput`].
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub goals: Option<Value>,
    #[serde(default)]
    pub tasks: Option<Value>,
}

/// Title page fields, trimmed and within bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitlePageData {
    pub university: String,
    pub faculty: String,
    pub department: String,
    pub work_title: String,
    pub student_name: String,
    pub supervisor_name: String,
    pub city: String,
    pub year: String,
}

/// Validated input to document assembly. Never mutated after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    pub profile: Profile,
    pub title: TitlePageData,
    pub goals: Vec<String>,
    pub tasks: Vec<String>,
}

impl DocumentInput {
    pub fn validate(self) -> Result<DocumentRequest> {
        let mut report = ValidationReport::default();

        let profile = string_field(&mut report, "profile", self.profile).and_then(|token| {
            match token.parse::<Profile>() {
                Ok(p) => Some(p),
                Err(_) => {
                    report.push("profile", "must match ^(gost|msu|hse)$");
                    None
                }
            }
        });

        let title = match self.title {
            None => {
                report.push("title", "field required");
                None
            }
            Some(value @ Value::Object(_)) => match serde_json::from_value::<TitlePageInput>(value) {
                Ok(input) => input.validate_into(&mut report),
                Err(e) => {
                    report.push("title", e.to_string());
                    None
                }
            },
            Some(other) => {
                report.push("title", format!("must be an object, got {}", json_type(&other)));
                None
            }
        };

        let goals = string_list(&mut report, "goals", self.goals);
        let tasks = string_list(&mut report, "tasks", self.tasks);

        report.into_result()?;

        match (profile, title) {
            (Some(profile), Some(title)) => Ok(DocumentRequest {
                profile,
                title,
                goals,
                tasks,
            }),
            // every None path above pushed into the report
            _ => Err(DiplomError::Internal {
                message: "validation passed with missing fields".into(),
            }),
        }
    }
}

impl TitlePageInput {
    fn validate_into(self, report: &mut ValidationReport) -> Option<TitlePageData> {
        let before = report.fields.len();
        let mut field = |name: &str, value: Option<Value>, bounds: (usize, usize)| {
            let path = format!("title.{}", name);
            let trimmed = string_field(report, &path, value)?.trim().to_string();
            check_text(report, &path, &trimmed, bounds);
            Some(trimmed)
        };

        let university = field("university", self.university, (2, 200));
        let faculty = field("faculty", self.faculty, (2, 200));
        let department = field("department", self.department, (2, 200));
        let work_title = field("workTitle", self.work_title, (3, 240));
        let student_name = field("studentName", self.student_name, (2, 120));
        let supervisor_name = field("supervisorName", self.supervisor_name, (2, 120));
        let city = field("city", self.city, (2, 120));
        let year = field("year", self.year, (4, 10));

        if report.fields.len() != before {
            return None;
        }
        Some(TitlePageData {
            university: university?,
            faculty: faculty?,
            department: department?,
            work_title: work_title?,
            student_name: student_name?,
            supervisor_name: supervisor_name?,
            city: city?,
            year: year?,
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn string_field(report: &mut ValidationReport, path: &str, value: Option<Value>) -> Option<String> {
    match value {
        None => {
            report.push(path, "field required");
            None
        }
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            report.push(path, format!("must be a string, got {}", json_type(&other)));
            None
        }
    }
}

fn string_list(report: &mut ValidationReport, field: &str, value: Option<Value>) -> Vec<String> {
    let items = match value {
        None => {
            report.push(field, "field required");
            return Vec::new();
        }
        Some(Value::Array(items)) => items,
        Some(other) => {
            report.push(
                field,
                format!("must be an array of strings, got {}", json_type(&other)),
            );
            return Vec::new();
        }
    };
    if items.is_empty() {
        report.push(field, "must contain at least one entry");
    }

    let mut entries = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let path = format!("{}[{}]", field, idx);
        let Some(entry) = string_field(report, &path, Some(item)) else {
            continue;
        };
        if entry.trim().is_empty() {
            report.push(path, "must not be blank");
        } else {
            check_xml_chars(report, &path, &entry);
        }
        entries.push(entry);
    }
    entries
}

fn check_text(report: &mut ValidationReport, field: &str, value: &str, (min, max): (usize, usize)) {
    let len = value.chars().count();
    if len < min || len > max {
        report.push(
            field,
            format!("length must be between {} and {} characters, got {}", min, max, len),
        );
    }
    check_xml_chars(report, field, value);
}

fn check_xml_chars(report: &mut ValidationReport, field: &str, value: &str) {
    if !value.chars().all(is_xml_char) {
        report.push(field, "contains characters not allowed in XML");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn title_json() -> serde_json::Value {
        json!({
            "university": "МГУ",
            "faculty": "Экономический факультет",
            "department": "Кафедра экономики",
            "workTitle": "Устойчивое развитие регионов",
            "studentName": "Иванов И.И.",
            "supervisorName": "Петров П.П.",
            "city": "Москва",
            "year": "2025"
        })
    }

    fn report_of(err: DiplomError) -> ValidationReport {
        match err {
            DiplomError::Validation(report) => report,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_topic_bounds() {
        let ok = GenerateRequest {
            topic: Some("abc".into()),
        };
        assert_eq!(ok.validate().unwrap(), "abc");

        let short = GenerateRequest {
            topic: Some("ab".into()),
        };
        assert!(report_of(short.validate().unwrap_err()).mentions("topic"));

        let long = GenerateRequest {
            topic: Some("я".repeat(241).into()),
        };
        assert!(long.validate().is_err());

        let max = GenerateRequest {
            topic: Some("я".repeat(240).into()),
        };
        assert!(max.validate().is_ok());
    }

    #[test]
    fn test_topic_kept_verbatim() {
        let req = GenerateRequest::new("  «кавычки» \"и\" пробелы ");
        assert_eq!(req.validate().unwrap(), "  «кавычки» \"и\" пробелы ");
    }

    #[test]
    fn test_valid_document_input() {
        let input: DocumentInput = serde_json::from_value(json!({
            "profile": "hse",
            "title": title_json(),
            "goals": ["Цель 1", "Цель 2"],
            "tasks": ["Задача 1"]
        }))
        .unwrap();
        let request = input.validate().unwrap();
        assert_eq!(request.profile, Profile::Hse);
        assert_eq!(request.title.work_title, "Устойчивое развитие регионов");
        assert_eq!(request.goals, vec!["Цель 1", "Цель 2"]);
    }

    #[test]
    fn test_snake_case_title_aliases() {
        let title: TitlePageInput = serde_json::from_value(json!({
            "work_title": "Тема",
            "student_name": "Студент",
            "supervisor_name": "Руководитель"
        }))
        .unwrap();
        assert_eq!(title.work_title, Some(json!("Тема")));
        assert_eq!(title.student_name, Some(json!("Студент")));
        assert_eq!(title.supervisor_name, Some(json!("Руководитель")));
    }

    #[test]
    fn test_report_collects_every_violation() {
        let mut title = title_json();
        title["city"] = json!(" ");
        title["year"] = json!("25");
        let input: DocumentInput = serde_json::from_value(json!({
            "profile": "mipt",
            "title": title,
            "goals": [],
            "tasks": ["ok", "   "]
        }))
        .unwrap();

        let report = report_of(input.validate().unwrap_err());
        assert!(report.mentions("profile"));
        assert!(report.mentions("title.city"));
        assert!(report.mentions("title.year"));
        assert!(report.mentions("goals"));
        assert!(report.mentions("tasks[1]"));
        assert!(!report.mentions("title.university"));
    }

    #[test]
    fn test_profile_is_case_sensitive() {
        let input = DocumentInput {
            profile: Some("GOST".into()),
            title: Some(title_json()),
            goals: Some(json!(["g"])),
            tasks: Some(json!(["t"])),
        };
        assert!(report_of(input.validate().unwrap_err()).mentions("profile"));
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let report = report_of(DocumentInput::default().validate().unwrap_err());
        for field in ["profile", "title", "goals", "tasks"] {
            assert!(report.mentions(field), "missing {}", field);
        }
    }

    #[test]
    fn test_title_fields_are_trimmed() {
        let mut title = title_json();
        title["city"] = json!("  Казань  ");
        let input = DocumentInput {
            profile: Some("gost".into()),
            title: Some(title),
            goals: Some(json!(["g"])),
            tasks: Some(json!(["t"])),
        };
        assert_eq!(input.validate().unwrap().title.city, "Казань");
    }

    #[test]
    fn test_item_request_kind() {
        let req = ItemRequest {
            kind: Some("task".into()),
        };
        assert_eq!(req.validate().unwrap(), ItemKind::Task);
        assert!(ItemRequest { kind: None }.validate().is_err());
        assert!(
            ItemRequest {
                kind: Some("chapter".into())
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_wrong_json_types_are_reported_per_field() {
        let mut title = title_json();
        title["year"] = json!(2025);
        let input: DocumentInput = serde_json::from_value(json!({
            "profile": 1,
            "title": title,
            "goals": [1, "ok", null],
            "tasks": "one task"
        }))
        .unwrap();

        let report = report_of(input.validate().unwrap_err());
        let constraint_of = |field: &str| {
            report
                .fields
                .iter()
                .find(|f| f.field == field)
                .map(|f| f.constraint.clone())
                .unwrap_or_default()
        };
        assert_eq!(constraint_of("title.year"), "must be a string, got number");
        assert_eq!(constraint_of("profile"), "must be a string, got number");
        assert!(report.mentions("goals[0]"));
        assert!(report.mentions("goals[2]"));
        assert!(!report.mentions("goals[1]"));
        assert!(constraint_of("tasks").starts_with("must be an array of strings"));
    }

    #[test]
    fn test_title_must_be_an_object() {
        let input = DocumentInput {
            profile: Some("gost".into()),
            title: Some(json!("МГУ")),
            goals: Some(json!(["g"])),
            tasks: Some(json!(["t"])),
        };
        assert!(report_of(input.validate().unwrap_err()).mentions("title"));
    }

    #[test]
    fn test_non_string_topic_and_type() {
        let topic = GenerateRequest {
            topic: Some(json!(5)),
        };
        assert!(report_of(topic.validate().unwrap_err()).mentions("topic"));

        let kind = ItemRequest {
            kind: Some(json!(true)),
        };
        assert!(report_of(kind.validate().unwrap_err()).mentions("type"));
    }

    #[test]
    fn test_control_characters_are_rejected() {
        let mut title = title_json();
        title["workTitle"] = json!("Тема\u{0007}работы");
        let input = DocumentInput {
            profile: Some("msu".into()),
            title: Some(title),
            goals: Some(json!(["a\u{1}b"])),
            tasks: Some(json!(["строка\nс переносом\tи табом"])),
        };

        let report = report_of(input.validate().unwrap_err());
        for field in ["title.workTitle", "goals[0]"] {
            let entry = report.fields.iter().find(|f| f.field == field).unwrap();
            assert_eq!(entry.constraint, "contains characters not allowed in XML");
        }
        assert!(!report.mentions("tasks[0]"));

        assert!(GenerateRequest::new("тема\u{1b}[0m").validate().is_err());
    }
}
