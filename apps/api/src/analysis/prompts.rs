// Stage prompt templates for the resume analysis pipelines.
// Placeholders are `{name}`; literal braces in the JSON examples are doubled.

/// Stage 1 of full analysis. Reads: resume_text, target_role, industry.
pub const CONTENT_ANALYSIS_TEMPLATE: &str = r#"Analyze the resume below for a candidate targeting the role of "{target_role}" in the {industry} industry.

Return a JSON object with this EXACT shape:
{{
  "strengths": ["Concrete strength backed by the resume"],
  "weaknesses": ["Specific gap or weakness for the target role"],
  "contentSuggestions": {{
    "summary": "A rewritten 2-3 sentence professional summary",
    "skills": ["Skill the candidate should surface more prominently"],
    "experience": ["Suggested rewrite of a weak experience bullet"]
  }}
}}

Rules:
- Base every point on the resume text. Do NOT invent employers, titles or metrics.
- Keep each list to at most 6 entries, most important first.

RESUME:
{resume_text}"#;

/// Stage 2 of full analysis. Reads: resume_text, target_role, content_analysis.
pub const IMPROVEMENTS_TEMPLATE: &str = r#"You previously analyzed this resume for the role of "{target_role}".

PRIOR ANALYSIS:
{content_analysis}

Using the analysis, produce prioritized improvement recommendations.

Return a JSON object with this EXACT shape:
{{
  "prioritizedActions": [
    {{"priority": 1, "action": "What to change", "rationale": "Why it matters for the role"}}
  ],
  "rewrittenSummary": "A polished professional summary ready to paste into the resume",
  "sectionFeedback": {{
    "experience": "Feedback on the experience section",
    "skills": "Feedback on the skills section",
    "education": "Feedback on the education section"
  }}
}}

Rules:
- At most 8 actions, priority 1 is the most impactful.
- Only recommend changes the candidate can make truthfully from the resume.

RESUME:
{resume_text}"#;

/// Stage 3 of full analysis. Reads: resume_text, job_description, industry, content_analysis.
pub const ATS_OPTIMIZATION_TEMPLATE: &str = r#"Act as an Applicant Tracking System (ATS) for the {industry} industry.
Score how well the resume matches the job description.

JOB DESCRIPTION:
{job_description}

PRIOR CONTENT ANALYSIS (for context only):
{content_analysis}

Return a JSON object with this EXACT shape:
{{
  "score": 72,
  "matchedKeywords": ["keyword present in both resume and job description"],
  "missedKeywords": ["important keyword missing from the resume"],
  "suggestions": ["Concrete change that would raise the ATS score"]
}}

Rules:
- "score" is a number from 0 to 100.
- If no job description is provided, score against typical postings for the industry.
- Keywords are short phrases (1-3 words), no duplicates.

RESUME:
{resume_text}"#;

/// Industry-only optimization. Reads: resume_text, industry.
pub const INDUSTRY_OPTIMIZATION_TEMPLATE: &str = r#"Review the resume below for fit with the {industry} industry.

Return a JSON object with this EXACT shape:
{{
  "industryKeywords": ["Term recruiters in this industry scan for"],
  "recommendations": ["Specific, actionable change to tailor the resume to the industry"],
  "industryTrends": ["Current trend the candidate could reference"]
}}

Rules:
- At most 10 keywords and 6 recommendations.
- Recommendations must be achievable from the candidate's actual experience.

RESUME:
{resume_text}"#;

/// Resume content generation. Reads: resume_text, target_role.
pub const RESUME_CONTENT_TEMPLATE: &str = r#"Write resume content for a candidate applying for the role of "{target_role}".

Return a JSON object with this EXACT shape:
{{
  "summary": "A 2-3 sentence professional summary",
  "skills": ["Skill", "Another skill"]
}}

Rules:
- "summary" must not be empty. "skills" must list at least 3 skills.
- Use only facts found in the source material below.

SOURCE MATERIAL:
{resume_text}"#;
