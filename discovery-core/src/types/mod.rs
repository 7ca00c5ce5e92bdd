mod evidence;
mod project;
mod question;
mod sow;

pub use evidence::{
    AdditionalDocument, Answer, AnswerSource, DocumentStatus, InformationImpact,
    InformationStatus, NewInformationItem, Transcript,
};
pub use project::{DiscoveryStatus, Project};
pub use question::{NewQuestion, Question, QuestionStatus, QuestionWithAnswer};
pub use sow::{Clarity, Requirement, RequirementMatch, ScopeBoundaries, Section, SowData};
