// Serialized form of an assignment.
//
// Field names follow the camelCase layout of the assignments file so that
// collections written by earlier versions of the editor load unchanged.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};

use crate::domain::{Assignment, assignment::Cover, assignment::CoverRow};

/// One assignment as stored in the assignments file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    /// Unique identifier.
    pub id: String,
    /// Assignment number.
    #[serde(default)]
    pub number: String,
    /// Assignment title.
    #[serde(default)]
    pub name: String,
    /// Course name.
    #[serde(default)]
    pub course_name: String,
    /// Course code.
    #[serde(default)]
    pub course_code: String,
    /// Student name.
    #[serde(default)]
    pub student_name: String,
    /// Student identifier.
    #[serde(default, rename = "studentID")]
    pub student_id: String,
    /// Semester.
    #[serde(default)]
    pub semester: String,
    /// Teacher name.
    #[serde(default)]
    pub teacher_name: String,
    /// Submission date.
    #[serde(default)]
    pub submission_date: String,
    /// University name.
    #[serde(default)]
    pub university_name: String,
    /// Export size ceiling in megabytes.
    #[serde(default, rename = "maxFileSizeMB")]
    pub max_file_size_mb: u32,
    /// Advisory page estimate.
    #[serde(default)]
    pub pages_needed: u32,
    /// Page markup, in order.
    #[serde(default)]
    pub content_pages: Vec<String>,
    /// Creation time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
    /// Last modification time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated_at: i64,
    /// Page border colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    /// Extra cover rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_rows: Option<Vec<CoverRowRecord>>,
}

/// A stored extra cover row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverRowRecord {
    /// Row label.
    #[serde(default)]
    pub label: String,
    /// Row value.
    #[serde(default)]
    pub value: String,
}

impl From<CoverRow> for CoverRowRecord {
    fn from(row: CoverRow) -> Self {
        Self {
            label: row.label,
            value: row.value,
        }
    }
}

impl From<CoverRowRecord> for CoverRow {
    fn from(record: CoverRowRecord) -> Self {
        Self {
            label: record.label,
            value: record.value,
        }
    }
}

impl From<Assignment> for AssignmentRecord {
    fn from(assignment: Assignment) -> Self {
        let Assignment {
            id,
            cover,
            max_file_size_mb,
            pages_needed,
            pages,
            created_at,
            updated_at,
        } = assignment;

        Self {
            id,
            number: cover.number,
            name: cover.name,
            course_name: cover.course_name,
            course_code: cover.course_code,
            student_name: cover.student_name,
            student_id: cover.student_id,
            semester: cover.semester,
            teacher_name: cover.teacher_name,
            submission_date: cover.submission_date,
            university_name: cover.university_name,
            max_file_size_mb,
            pages_needed,
            content_pages: pages.into(),
            created_at,
            updated_at,
            border_color: cover.border_color,
            cover_rows: cover
                .rows
                .map(|rows| rows.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<AssignmentRecord> for Assignment {
    /// An empty page list is repaired to a single empty page.
    fn from(record: AssignmentRecord) -> Self {
        let pages = NonEmpty::from_vec(record.content_pages).unwrap_or_else(|| {
            tracing::debug!("assignment {} had no pages; adding an empty one", record.id);
            NonEmpty::new(String::new())
        });

        Self {
            id: record.id,
            cover: Cover {
                number: record.number,
                name: record.name,
                course_name: record.course_name,
                course_code: record.course_code,
                student_name: record.student_name,
                student_id: record.student_id,
                semester: record.semester,
                teacher_name: record.teacher_name,
                submission_date: record.submission_date,
                university_name: record.university_name,
                border_color: record.border_color,
                rows: record
                    .cover_rows
                    .map(|rows| rows.into_iter().map(Into::into).collect()),
            },
            max_file_size_mb: record.max_file_size_mb,
            pages_needed: record.pages_needed,
            pages,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_camel_case_fields() {
        let json = r##"{
            "id": "a1",
            "number": "03",
            "name": "Thermodynamics",
            "courseName": "Heat Transfer",
            "courseCode": "ME-301",
            "studentName": "Nimra",
            "studentID": "F21-0042",
            "teacherName": "Dr. Khan",
            "submissionDate": "",
            "universityName": "RAYNEX UNIVERSITY",
            "maxFileSizeMB": 5,
            "pagesNeeded": 34,
            "contentPages": ["<p>one</p>", "<p>two</p>"],
            "createdAt": 1700000000000,
            "updatedAt": 1700000000500,
            "borderColor": "#2563EB",
            "coverRows": [{"label": "Section", "value": "B"}]
        }"##;

        let record: AssignmentRecord = serde_json::from_str(json).unwrap();
        let assignment = Assignment::from(record);

        assert_eq!(assignment.id(), "a1");
        assert_eq!(assignment.cover().student_id, "F21-0042");
        assert_eq!(assignment.cover().semester, "");
        assert_eq!(assignment.max_file_size_mb(), 5);
        assert_eq!(assignment.page_count(), 2);
        assert_eq!(assignment.cover_rows(), &[CoverRow::new("Section", "B")]);
    }

    #[test]
    fn empty_page_list_is_repaired() {
        let json = r#"{"id": "a1", "contentPages": []}"#;
        let record: AssignmentRecord = serde_json::from_str(json).unwrap();

        let assignment = Assignment::from(record);
        assert_eq!(assignment.page_count(), 1);
        assert_eq!(assignment.page(0).unwrap(), "");
    }

    #[test]
    fn absent_optional_fields_are_not_written() {
        let assignment = Assignment::with_id("a1".to_string(), Default::default(), 0);
        let json = serde_json::to_string(&AssignmentRecord::from(assignment)).unwrap();

        assert!(!json.contains("borderColor"));
        assert!(!json.contains("coverRows"));
        assert!(json.contains(r#""studentID":"""#));
        assert!(json.contains(r#""maxFileSizeMB":0"#));
    }
}
