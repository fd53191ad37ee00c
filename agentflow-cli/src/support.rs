//! Sample inputs for the demo commands

use agentflow_core::workflow::RouteTable;

pub const Q3_REPORT: &str = "Q3 Performance Summary:
Our customer satisfaction score rose to 92 points this quarter.
Revenue grew by 45% compared to last year.
Market share is now at 23% in our primary market.
Customer churn decreased to 5% from 8%.
New user acquisition cost is $43 per user.
Product adoption rate increased to 78%.
Employee satisfaction is at 87 points.
Operating margin improved to 34%.";

pub const STAKEHOLDER_PROMPT: &str = "Analyze how market changes will impact this stakeholder group.
Provide specific impacts and recommended actions.
Format with clear sections and priorities.";

pub fn stakeholders() -> Vec<String> {
    [
        "Customers:\n- Price sensitive\n- Want better tech\n- Environmental concerns",
        "Employees:\n- Job security worries\n- Need new skills\n- Want clear direction",
        "Investors:\n- Expect growth\n- Want cost control\n- Risk concerns",
        "Suppliers:\n- Capacity constraints\n- Price pressures\n- Tech transitions",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub const DEFAULT_PRODUCT_TASK: &str =
    "Write a product description for a new eco-friendly water bottle";

pub const DEFAULT_CODING_TASK: &str = "<user input>
Implement a Stack with:
1. push(x)
2. pop()
3. getMin()
All operations should be O(1).
All inner fields should be private and when used should be prefixed with 'this.'.
</user input>";

/// Support ticket text by incident id
pub fn ticket(id: &str) -> Option<&'static str> {
    match id.trim().to_uppercase().as_str() {
        "INC001" => Some(
            "Subject: Can't access my account\n\
             Message: Hi, I've been trying to log in for the past hour but keep getting \
             an 'invalid password' error. I'm sure I'm using the right password. \
             Can you help me regain access? This is urgent as I need to submit a report by end of day.\n\
             - John",
        ),
        "INC002" => Some(
            "Subject: Unexpected charge on my card\n\
             Message: Hello, I just noticed a charge of $49.99 on my credit card from your \
             company, but I thought I was on the $29.99 plan. Can you explain this charge \
             and adjust it if it's a mistake?\n\
             Thanks,\nSarah",
        ),
        "INC003" => Some(
            "Subject: How to export data?\n\
             Message: I need to export all my project data to Excel. I've looked through \
             the docs but can't figure out how to do a bulk export. Is this possible? \
             If so, could you walk me through the steps?\n\
             Best regards,\nMike",
        ),
        _ => None,
    }
}

/// Specialist prompts keyed by support team
pub fn support_routes() -> RouteTable {
    RouteTable::from([
        (
            "billing".to_string(),
            "You are a billing support specialist. Follow these guidelines:
1. Always start with \"Billing Support Response:\"
2. First acknowledge the specific billing issue
3. Explain any charges or discrepancies clearly
4. List concrete next steps with timeline
5. End with payment options if relevant

Keep responses professional but friendly."
                .to_string(),
        ),
        (
            "technical".to_string(),
            "You are a technical support engineer. Follow these guidelines:
1. Always start with \"Technical Support Response:\"
2. List exact steps to resolve the issue
3. Include system requirements if relevant
4. Provide workarounds for common problems
5. End with escalation path if needed

Use clear, numbered steps and technical details."
                .to_string(),
        ),
        (
            "account".to_string(),
            "You are an account security specialist. Follow these guidelines:
1. Always start with \"Account Support Response:\"
2. Prioritize account security and verification
3. Provide clear steps for account recovery/changes
4. Include security tips and warnings
5. Set clear expectations for resolution time

Maintain a serious, security-focused tone."
                .to_string(),
        ),
        (
            "product".to_string(),
            "You are a product specialist. Follow these guidelines:
1. Always start with \"Product Support Response:\"
2. Focus on feature education and best practices
3. Include specific examples of usage
4. Link to relevant documentation sections
5. Suggest related features that might help

Be educational and encouraging in tone."
                .to_string(),
        ),
    ])
}
