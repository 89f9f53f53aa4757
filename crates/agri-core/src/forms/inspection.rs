// ============================================================================
// Inspection report form
// ============================================================================
// The stage is never chosen by the user: it follows from the role filing the
// report. The result defaults to PASS.
// ============================================================================

use std::path::PathBuf;

use crate::api::MultipartForm;
use crate::error::ValidationError;
use crate::types::{InspectionResult, InspectionStage, Role};

#[derive(Debug, Clone, PartialEq)]
pub struct InspectionDraft {
    pub batch: i64,
    pub stage: InspectionStage,
    pub result: InspectionResult,
    pub notes: String,
    /// Optional report document or photo
    pub report_file: Option<PathBuf>,
}

impl InspectionDraft {
    /// Draft for the stage that matches `role`. Admins and consumers do not
    /// file inspections.
    pub fn for_role(batch: i64, role: Role) -> Result<Self, ValidationError> {
        let stage = role
            .inspection_stage()
            .ok_or(ValidationError::MissingField("Inspection stage"))?;

        Ok(Self {
            batch,
            stage,
            result: InspectionResult::default(),
            notes: String::new(),
            report_file: None,
        })
    }

    pub fn title(&self) -> &'static str {
        self.stage.form_title()
    }

    /// Build the multipart body, reading the report file if one is attached
    pub async fn to_multipart(&self) -> Result<MultipartForm, ValidationError> {
        let mut form = MultipartForm::new()
            .text("batch", self.batch.to_string())
            .text("stage", self.stage.as_str())
            .text("result", self.result.as_str())
            .text("inspection_notes", self.notes.as_str());

        if let Some(path) = &self.report_file {
            let bytes = tokio::fs::read(path).await.map_err(|e| ValidationError::ReportFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "report".to_string());
            form = form.file("report_file", &file_name, bytes);
        }

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_follows_role() {
        let draft = InspectionDraft::for_role(3, Role::Transporter).unwrap();
        assert_eq!(draft.stage, InspectionStage::Transporter);
        assert_eq!(draft.result, InspectionResult::Pass);
        assert_eq!(draft.title(), "Transporter Inspection");

        assert!(InspectionDraft::for_role(3, Role::Consumer).is_err());
    }

    #[tokio::test]
    async fn test_attaches_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moisture.txt");
        std::fs::write(&path, b"moisture 11%").unwrap();

        let mut draft = InspectionDraft::for_role(3, Role::Retailer).unwrap();
        draft.report_file = Some(path);

        let form = draft.to_multipart().await.unwrap();
        assert_eq!(form.field("stage"), Some("retailer"));
        assert_eq!(form.files.len(), 1);
        assert_eq!(form.files[0].field, "report_file");
        assert_eq!(form.files[0].file_name, "moisture.txt");
        assert_eq!(form.files[0].bytes, b"moisture 11%".to_vec());
    }

    #[tokio::test]
    async fn test_missing_report_file() {
        let mut draft = InspectionDraft::for_role(3, Role::Farmer).unwrap();
        draft.report_file = Some(PathBuf::from("/nonexistent/report.pdf"));
        assert!(matches!(
            draft.to_multipart().await,
            Err(ValidationError::ReportFile { .. })
        ));
    }
}
