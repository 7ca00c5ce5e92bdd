//! Question generation from extracted SOW data.
//!
//! Requirements are ranked deterministically ([`categorize`]), then each one
//! gets a generation call with related requirements and matched document
//! snippets as context. Unclear boundaries and industry-specific topics get
//! one call each. Every origin group then passes through a refinement call;
//! a group whose refinement fails keeps its drafts.
//!
//! Nothing here writes to storage.

pub mod categorize;
pub mod followup;
pub mod industry;
pub mod refine;
pub mod related;


use crate::generator::TextGenerator;
use crate::parser::{self, fields, Record};
use crate::settings::EngineSettings;
use crate::types::{NewQuestion, Requirement, Section, SowData};
use categorize::RankedRequirement;
use industry::ProjectType;
use refine::RefinementReport;
use regex::Regex;
use serde::Serialize;

pub use followup::{judge_answer, FollowupVerdict};

/// Source label for boundary questions
pub const BOUNDARY_SOURCE: &str = "Unclear Boundary";

/// Section text kept per context block in generation prompts
const CONTEXT_SECTION_CHARS: usize = 1500;

/// Supporting snippets quoted per requirement
const MAX_SNIPPETS: usize = 5;

pub fn requirement_source(id: &str) -> String {
    format!("Requirement: {id}")
}

pub fn industry_source(project_type: ProjectType) -> String {
    format!("Industry: {project_type}")
}

/// A question from a parsed record; records without question text are dropped
pub fn question_from_record(record: &Record) -> Option<NewQuestion> {
    let text = fields::text(record, &["question", "text"])?;
    Some(NewQuestion {
        question: text,
        context: fields::text_or(record, &["context", "explanation"], ""),
        priority: fields::priority(record),
        target_stakeholder: fields::text(record, &["target_stakeholder", "stakeholder"]),
        ..Default::default()
    })
}

/// Questions ready to persist plus per-group refinement counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeneratedQuestions {
    pub questions: Vec<NewQuestion>,
    pub project_type: Option<ProjectType>,
    pub refinement: Vec<RefinementReport>,
}

pub struct QuestionGenerator {
    generator: TextGenerator,
    settings: EngineSettings,
}

impl QuestionGenerator {
    pub fn new(generator: TextGenerator, settings: EngineSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub async fn generate(&self, project_name: &str, sow: &SowData) -> GeneratedQuestions {
        if sow.requirements.is_empty() {
            tracing::info!("No requirements, nothing to ask");
            return GeneratedQuestions::default();
        }

        let ranked = categorize::rank_requirements(&sow.requirements);
        let context = ProjectContext::from_sections(project_name, &sow.sections);
        let mut drafts = Vec::new();

        for entry in &ranked {
            drafts.extend(self.requirement_questions(entry, sow, &context).await);
        }

        if !sow.boundaries.unclear.is_empty() {
            drafts.extend(self.boundary_questions(&sow.boundaries.unclear).await);
        }

        let project_type = industry::classify(&sow.sections);
        drafts.extend(self.industry_questions(project_type, &context).await);

        tracing::info!(
            requirements = ranked.len(),
            drafts = drafts.len(),
            project_type = %project_type,
            "Drafted questions"
        );

        let mut questions = Vec::new();
        let mut refinement = Vec::new();
        for (source, group) in refine::group_by_source(drafts) {
            let (refined, report) =
                refine::refine_group(&self.generator, &source, group, self.settings.refined_group_cap)
                    .await;
            questions.extend(refined);
            refinement.push(report);
        }

        // refinement may reintroduce identifiers
        let questions = drop_leaked_ids(questions, &sow.requirements);

        GeneratedQuestions {
            questions,
            project_type: Some(project_type),
            refinement,
        }
    }

    async fn requirement_questions(
        &self,
        entry: &RankedRequirement<'_>,
        sow: &SowData,
        context: &ProjectContext,
    ) -> Vec<NewQuestion> {
        let requirement = entry.requirement;
        let related = related::related_requirements(
            requirement,
            &sow.requirements,
            self.settings.max_related_requirements,
        );
        let snippets: Vec<&str> = sow
            .requirement_matches
            .get(&requirement.id)
            .map(|matches| {
                matches
                    .iter()
                    .take(MAX_SNIPPETS)
                    .map(|m| m.context.as_str())
                    .collect()
            })
            .unwrap_or_default();

        let prompt = requirement_prompt(entry, &related, &snippets, context);
        let response = match self.generator.generate(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(requirement = %requirement.id, error = %e, "Question generation failed for requirement");
                return Vec::new();
            }
        };

        let questions: Vec<NewQuestion> = parser::parse_list(&response)
            .into_inner()
            .iter()
            .filter_map(question_from_record)
            .map(|q| q.with_source(requirement_source(&requirement.id), requirement.text.clone()))
            .collect();
        let questions = drop_leaked_ids(questions, &sow.requirements);

        questions
            .into_iter()
            .take(self.settings.max_questions_per_requirement)
            .collect()
    }

    async fn boundary_questions(&self, unclear: &[String]) -> Vec<NewQuestion> {
        let response = match self.generator.generate(&boundary_prompt(unclear)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Boundary question generation failed");
                return Vec::new();
            }
        };

        parser::parse_list(&response)
            .into_inner()
            .iter()
            .filter_map(|record| {
                let item = fields::text(record, &["item"]).or_else(|| match unclear {
                    [only] => Some(only.clone()),
                    _ => None,
                });
                question_from_record(record).map(|q| {
                    q.with_source(
                        BOUNDARY_SOURCE,
                        item.unwrap_or_else(|| "Boundary item".to_string()),
                    )
                })
            })
            .collect()
    }

    async fn industry_questions(
        &self,
        project_type: ProjectType,
        context: &ProjectContext,
    ) -> Vec<NewQuestion> {
        let response = match self
            .generator
            .generate(&industry_prompt(project_type, context))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(project_type = %project_type, error = %e, "Industry question generation failed");
                return Vec::new();
            }
        };

        parser::parse_list(&response)
            .into_inner()
            .iter()
            .filter_map(|record| {
                let topic = fields::text_or(record, &["category", "item"], "Industry considerations");
                question_from_record(record)
                    .map(|q| q.with_source(industry_source(project_type), topic))
            })
            .collect()
    }
}

/// Drop questions whose text names a requirement id as a whole token
fn drop_leaked_ids(questions: Vec<NewQuestion>, requirements: &[Requirement]) -> Vec<NewQuestion> {
    let patterns: Vec<Regex> = requirements
        .iter()
        .map(|r| r.id.trim())
        .filter(|id| !id.is_empty())
        .filter_map(|id| {
            Regex::new(&format!(
                r"(?i)(?:^|[^a-z0-9]){}(?:$|[^a-z0-9])",
                regex::escape(id)
            ))
            .ok()
        })
        .collect();
    questions
        .into_iter()
        .filter(|q| {
            let leaked = patterns.iter().any(|p| p.is_match(&q.question));
            if leaked {
                tracing::debug!(question = %q.question, "Dropping question that names a requirement id");
            }
            !leaked
        })
        .collect()
}

/// Project-level context shared by generation prompts
struct ProjectContext {
    name: String,
    overview: String,
    stakeholders: String,
    deliverables: String,
}

impl ProjectContext {
    fn from_sections(name: &str, sections: &[Section]) -> Self {
        let find = |keys: &[&str]| -> String {
            sections
                .iter()
                .find(|s| {
                    let name = s.name.to_lowercase();
                    keys.iter().any(|k| name.contains(k))
                })
                .map(|s| crate::settings::truncate_chars(&s.content, CONTEXT_SECTION_CHARS).to_string())
                .unwrap_or_else(|| "Not specified".to_string())
        };

        Self {
            name: name.to_string(),
            overview: find(&["overview", "introduction", "background", "purpose", "summary"]),
            stakeholders: find(&["stakeholder", "roles", "responsibilit", "contact"]),
            deliverables: find(&["deliverable"]),
        }
    }
}

fn requirement_prompt(
    entry: &RankedRequirement<'_>,
    related: &[&Requirement],
    snippets: &[&str],
    context: &ProjectContext,
) -> String {
    let requirement = entry.requirement;
    let related_text = if related.is_empty() {
        "None".to_string()
    } else {
        related
            .iter()
            .map(|r| format!("- ({}) {}", r.section, r.text))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let snippet_text = if snippets.is_empty() {
        "None".to_string()
    } else {
        snippets
            .iter()
            .map(|s| format!("- \"{s}\""))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are preparing discovery questions for the project "{name}".

PROJECT OVERVIEW:
{overview}

STAKEHOLDERS:
{stakeholders}

DELIVERABLES:
{deliverables}

REQUIREMENT:
Text: {text}
Section: {section}
Clarity: {clarity}
Ambiguity type: {category}
Reason: {reason}
Suggested priority: {priority}

RELATED REQUIREMENTS:
{related_text}

SUPPORTING EXCERPTS FROM PROJECT DOCUMENTS:
{snippet_text}

Generate 1-3 specific, clear questions that would remove the uncertainty in this requirement.
Each question should address one aspect. Do not mention requirement identifiers.

Format your response as a JSON array of objects with keys:
- question: The specific question text
- context: Brief explanation of why this question needs to be asked
- priority: A value from 1-3 (1 being highest priority)
- target_stakeholder: Who should answer"#,
        name = context.name,
        overview = context.overview,
        stakeholders = context.stakeholders,
        deliverables = context.deliverables,
        text = requirement.text,
        section = requirement.section,
        clarity = requirement.clarity.as_str(),
        category = entry.category.as_str(),
        reason = requirement.reason.as_deref().unwrap_or("None"),
        priority = entry.priority,
    )
}

fn boundary_prompt(unclear: &[String]) -> String {
    let items = unclear
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"The following items in a Statement of Work have unclear boundaries or scope:

{items}

For each unclear item, generate 1-2 specific questions that would help clarify the scope.

Format your response as a JSON array of objects with keys:
- item: The unclear item being addressed
- question: The specific question text
- context: Brief explanation of why this question needs to be asked
- priority: A value from 1-3 (1 being highest priority)"#
    )
}

fn industry_prompt(project_type: ProjectType, context: &ProjectContext) -> String {
    let focus = project_type
        .focus_areas()
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an experienced delivery lead for {kind} engagements reviewing the project "{name}".

PROJECT OVERVIEW:
{overview}

DELIVERABLES:
{deliverables}

Generate 2-4 questions that engagements of this kind usually need answered before work starts, covering:
{focus}

Format your response as a JSON array of objects with keys:
- question
- context
- priority: A value from 1-3 (1 being highest priority)
- category: The focus area the question belongs to
- target_stakeholder"#,
        kind = project_type.as_str().replace('_', " "),
        name = context.name,
        overview = context.overview,
        deliverables = context.deliverables,
    )
}
