//! LLM response types — ReconstructionResult, SopData, ChatMessage.
//!
//! These match the JSON shapes declared in schema.rs. The model returns
//! JSON that deserializes directly into these types.

use serde::{Deserialize, Serialize};

/// The reconstructed SOP returned by the reconstruction pipeline.
///
/// Field names are snake_case on the wire, matching the prompt contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionResult {
    pub process_overview: ProcessOverview,
    pub steps: Vec<Step>,
    pub checks_and_risks: ChecksAndRisks,
    pub execution_checklist: Vec<String>,
    pub loom_script: Vec<LoomScriptItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOverview {
    pub process_name: String,
    pub role: String,
    pub system_type: String,
    pub goal: String,
    pub assumptions: Vec<String>,
}

/// One operator action. `step` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step: u32,
    pub title: String,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecksAndRisks {
    pub checks: Vec<String>,
    pub risks: Vec<String>,
}

/// Voiceover line for a screen-recording walkthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoomScriptItem {
    pub step: u32,
    pub narration: String,
    pub focus: String,
}

/// Where a ReconstructionResult came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Live,
    Fallback,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSource::Live => "live",
            ResultSource::Fallback => "fallback",
        }
    }
}

/// A pipeline outcome: the result plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconstruction {
    pub result: ReconstructionResult,
    pub source: ResultSource,
}

/// Mismatches between `steps` and `loom_script`, by step number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptAlignment {
    pub steps_without_narration: Vec<u32>,
    pub narration_without_step: Vec<u32>,
}

impl ScriptAlignment {
    pub fn is_aligned(&self) -> bool {
        self.steps_without_narration.is_empty() && self.narration_without_step.is_empty()
    }
}

impl ReconstructionResult {
    /// Fallback result for when the model call fails or returns invalid JSON.
    /// A realistic four-step QC inspection so the caller never dead-ends.
    pub fn fallback() -> Self {
        Self {
            process_overview: ProcessOverview {
                process_name: "Quality Control Inspection Log".to_string(),
                role: "Quality Assurance Technician".to_string(),
                system_type: "QMS (Quality Management System)".to_string(),
                goal: "Log and verify visual inspection results for Batch #4092".to_string(),
                assumptions: vec![
                    "User has already logged in".to_string(),
                    "Batch record exists".to_string(),
                ],
            },
            steps: vec![
                Step {
                    step: 1,
                    title: "Access Inspection Module".to_string(),
                    instruction: "Navigate to the 'Quality Control' tab and select 'Daily Inspection Log' from the dropdown menu.".to_string(),
                },
                Step {
                    step: 2,
                    title: "Locate Batch Record".to_string(),
                    instruction: "Enter '4092' in the Batch ID search field and press Enter to retrieve the record.".to_string(),
                },
                Step {
                    step: 3,
                    title: "Enter Visual Defects".to_string(),
                    instruction: "In the 'Visual Inspection' section, input '0' for major defects and '2' for minor cosmetic scratches.".to_string(),
                },
                Step {
                    step: 4,
                    title: "Verify & Submit".to_string(),
                    instruction: "Review the summary statistics, check the 'Verified by Operator' box, and click the green 'Commit Log' button.".to_string(),
                },
            ],
            checks_and_risks: ChecksAndRisks {
                checks: vec![
                    "Ensure Batch ID matches physical traveler card".to_string(),
                    "Verify user certification is active".to_string(),
                ],
                risks: vec![
                    "Session timeout if data entry takes too long".to_string(),
                    "Incorrect defect classification".to_string(),
                ],
            },
            execution_checklist: vec![
                "Open QC Module".to_string(),
                "Search Batch #4092".to_string(),
                "Log defects (0 major, 2 minor)".to_string(),
                "Submit record".to_string(),
            ],
            loom_script: vec![
                LoomScriptItem {
                    step: 1,
                    narration: "First, the operator navigates to the Quality Control module to begin the daily logging process.".to_string(),
                    focus: "Top navigation bar, Quality Control tab".to_string(),
                },
                LoomScriptItem {
                    step: 2,
                    narration: "They efficiently locate the specific production batch by entering the ID into the quick search field.".to_string(),
                    focus: "Search bar, Batch ID input".to_string(),
                },
                LoomScriptItem {
                    step: 3,
                    narration: "Critical quality data is entered here. Notice how they distinguish between major and minor defects.".to_string(),
                    focus: "Data entry form, visual inspection fields".to_string(),
                },
                LoomScriptItem {
                    step: 4,
                    narration: "Finally, the record is verified and committed to the system, completing the audit trail.".to_string(),
                    focus: "Submit button, success toast notification".to_string(),
                },
            ],
        }
    }

    /// Compare step numbers in `steps` against `loom_script`.
    ///
    /// Informational only — the pipeline never rewrites either list.
    pub fn script_alignment(&self) -> ScriptAlignment {
        let step_numbers: Vec<u32> = self.steps.iter().map(|s| s.step).collect();
        let script_numbers: Vec<u32> = self.loom_script.iter().map(|l| l.step).collect();

        ScriptAlignment {
            steps_without_narration: step_numbers
                .iter()
                .copied()
                .filter(|n| !script_numbers.contains(n))
                .collect(),
            narration_without_step: script_numbers
                .iter()
                .copied()
                .filter(|n| !step_numbers.contains(n))
                .collect(),
        }
    }
}

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}

/// Single-screenshot SOP returned by the ANALYZE pipeline.
///
/// Older, flatter shape than ReconstructionResult; camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SopData {
    pub overview: SopOverview,
    pub steps: Vec<String>,
    pub risks: Vec<SopRisk>,
    pub checklist: Vec<String>,
    pub loom_script: Vec<SopScriptLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SopOverview {
    pub process_name: String,
    pub role: String,
    pub system_type: String,
    pub goal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopRisk {
    pub check: String,
    pub risk: String,
}

/// `step` is free text here ("Step 1", "Login"), unlike LoomScriptItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopScriptLine {
    pub step: String,
    pub narration: String,
    pub focus: String,
}
