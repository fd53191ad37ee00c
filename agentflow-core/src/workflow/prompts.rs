//! Default prompt templates
//!
//! Templates use `{name}` placeholders filled by [`render`]. Any other braces,
//! such as the JSON examples embedded in several prompts, are left alone.

use regex::Regex;
use std::sync::LazyLock;

/// Step 1: pull `value: metric` pairs out of free text
pub const CHAIN_EXTRACT: &str = "Extract only the numerical values and their associated metrics from the text.
Format each as 'value: metric' on a new line.
Example format:
92: customer satisfaction
45%: revenue growth";

/// Step 2: normalise values to percentages
pub const CHAIN_NORMALIZE: &str = "Convert all numerical values to percentages where possible.
If not a percentage or points, convert to decimal (e.g., 92 points -> 92%).
Keep one number per line.
Example format:
92%: customer satisfaction
45%: revenue growth";

/// Step 3: sort descending
pub const CHAIN_SORT: &str = "Sort all lines in descending order by numerical value.
Keep the format 'value: metric' on each line.
Example:
92%: customer satisfaction
87%: employee satisfaction";

/// Step 4: render a markdown table
pub const CHAIN_TABLE: &str = "Format the sorted data as a markdown table with columns:
| Metric | Value |
|:--|--:|
| Customer Satisfaction | 92% |";

/// The four-step report formatting chain
pub fn default_chain_steps() -> Vec<String> {
    [CHAIN_EXTRACT, CHAIN_NORMALIZE, CHAIN_SORT, CHAIN_TABLE]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Classifier prompt; placeholders `{routes}` and `{input}`
pub const ROUTE_SELECTOR: &str = r#"Analyze the input and select the most appropriate support team from these options: {routes}
First explain your reasoning, then provide your selection in this JSON format:

{
    "reasoning": "Brief explanation of why this ticket should be routed to a specific team. Consider key terms, user intent, and urgency level.",
    "selection": "The chosen team name"
}

Input: {input}"#;

/// Planner prompt; placeholder `{task}`
pub const ORCHESTRATOR: &str = r#"Analyze this task and break it down into 2-3 distinct approaches:

Task: {task}

Return your response in this JSON format:
{
"analysis": "Explain your understanding of the task and which variations would be valuable. Focus on how each approach serves different aspects of the task.",
"tasks": [
    {
    "type": "formal",
    "description": "Write a precise, technical version that emphasizes specifications"
    },
    {
    "type": "conversational",
    "description": "Write an engaging, friendly version that connects with readers"
    }
]
}"#;

/// Worker prompt; placeholders `{original_task}`, `{task_type}`, `{task_description}`
pub const WORKER: &str = "Generate content based on:
Task: {original_task}
Style: {task_type}
Guidelines: {task_description}";

pub const GENERATOR: &str = r#"Your goal is to complete the task based on the input. If there are feedback
from your previous generations, you should reflect on them to improve your solution.

CRITICAL: Your response must be a SINGLE LINE of valid JSON with NO LINE BREAKS except those explicitly escaped with \n.
Here is the exact format to follow, including all quotes and braces:

{"thoughts":"Brief description here","response":"public class Example {\n    // Code here\n}"}

Rules for the response field:
1. ALL line breaks must use \n
2. ALL quotes must use \"
3. ALL backslashes must be doubled: \\
4. NO actual line breaks or formatting - everything on one line
5. NO tabs or special characters
6. Code must be complete and properly escaped

Follow this format EXACTLY - your response must be valid JSON on a single line."#;

pub const EVALUATOR: &str = r#"Evaluate this code implementation for correctness, time complexity, and best practices.
Ensure the code has proper documentation.
Respond with EXACTLY this JSON format on a single line:

{"evaluation":"PASS, NEEDS_IMPROVEMENT, or FAIL", "feedback":"Your feedback here"}

The evaluation field must be one of: "PASS", "NEEDS_IMPROVEMENT", "FAIL"
Use "PASS" only if all criteria are met with no improvements needed."#;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder regex"));

/// Substitute `{name}` placeholders in a single pass.
///
/// Placeholders without a matching variable are kept verbatim, and
/// substituted values are never themselves re-scanned.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
