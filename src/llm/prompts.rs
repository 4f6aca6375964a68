//! Prompt templates and model defaults.
//!
//! These prompts are the contract between the app and the model. The JSON
//! shape spelled out in the reconstruct prompt must stay in sync with
//! `schema::RECONSTRUCTION_SCHEMA` (checked by a unit test below).

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Literal assistant turn substituted when a chat call fails.
pub const CHAT_ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

const RECONSTRUCT_OUTPUT_SHAPE: &str = r#"{
  "process_overview": {
    "process_name": string,
    "role": string,
    "system_type": string,
    "goal": string,
    "assumptions": string[]
  },
  "steps": [
    { "step": number, "title": string, "instruction": string }
  ],
  "checks_and_risks": {
    "checks": string[],
    "risks": string[]
  },
  "execution_checklist": string[],
  "loom_script": [
    { "step": number, "narration": string, "focus": string }
  ]
}"#;

/// Builds the RECONSTRUCT instruction text for `image_count` screenshots.
///
/// The images themselves are attached as separate inline parts.
pub fn build_reconstruct_prompt(image_count: usize, context: Option<&str>) -> String {
    let plural = if image_count == 1 { "" } else { "s" };
    let context_line = match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => format!("\nAdditional user context: \"{}\"\n", c),
        None => String::new(),
    };

    format!(
        r#"You are an AI assistant for industrial engineers.

You are given {image_count} screenshot{plural} of legacy industrial software (MES, ERP, or QMS).
The screenshots are in sequence and represent a workflow being performed.
Your task is to reconstruct the complete workflow from these real industrial artifacts
and turn it into an action-ready SOP and a short Loom-style walkthrough.

From the screenshot(s), infer:
- Process being performed across all screens, as one continuous workflow (not per screenshot)
- Role performing it
- Goal of the process
- How each screenshot connects to form a complete workflow
{context_line}
Then produce:

1. Process overview (process name, role, system type, goal, assumptions)
2. Step-by-step instructions (one action per step, operational language)
   - Reference which screenshot each step corresponds to when relevant
3. Checks & risks (approvals, compliance, common failure points)
4. Execution checklist (concise, actionable)
5. Loom-style walkthrough script:
   - For each step: 1-2 sentences narration
   - What the viewer should focus on in the screen

Constraints:
- Do not assume APIs or automation
- Do not assume live screen recording
- Base reasoning only on visible information
- Explicitly state assumptions
- Be concise and execution-focused

Output ONLY strict JSON matching this schema exactly. No prose, no markdown:

{shape}
"#,
        shape = RECONSTRUCT_OUTPUT_SHAPE,
    )
}

/// ANALYZE prompt for the single-screenshot path.
pub const ANALYZE_PROMPT: &str = r#"You are a senior Industrial Engineer specializing in process optimization and legacy system migration.
Analyze the attached screenshot from an industrial software interface (MES, ERP, QMS, or similar).

Tasks:
1. Identify the core process being performed.
2. Determine the role of the operator.
3. Reconstruct the operational sequence.
4. Highlight compliance and safety risks.

If the image is not legacy industrial software (e.g., a modern design site), treat it as a 'System Navigation Training' process for that specific UI.

Output the result in strict JSON format based on the provided response schema."#;
