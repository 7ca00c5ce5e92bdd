use crate::types::Section;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    SoftwareDevelopment,
    Consulting,
    Training,
    Infrastructure,
    Default,
}

const SIGNALS: &[(ProjectType, &[&str])] = &[
    (
        ProjectType::SoftwareDevelopment,
        &[
            "software",
            "application",
            "develop",
            "api",
            "database",
            "web",
            "mobile",
            "portal",
            "code",
            "integration",
        ],
    ),
    (
        ProjectType::Consulting,
        &[
            "consult",
            "advisory",
            "assessment",
            "strategy",
            "recommendation",
            "audit",
            "analysis",
        ],
    ),
    (
        ProjectType::Training,
        &[
            "training",
            "workshop",
            "curriculum",
            "course",
            "learning",
            "instructor",
            "onboarding",
        ],
    ),
    (
        ProjectType::Infrastructure,
        &[
            "infrastructure",
            "network",
            "server",
            "hardware",
            "cloud",
            "data center",
            "datacenter",
            "firewall",
        ],
    ),
];

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::SoftwareDevelopment => "software_development",
            ProjectType::Consulting => "consulting",
            ProjectType::Training => "training",
            ProjectType::Infrastructure => "infrastructure",
            ProjectType::Default => "default",
        }
    }

    /// Topics the industry question prompt asks about
    pub fn focus_areas(&self) -> &'static [&'static str] {
        match self {
            ProjectType::SoftwareDevelopment => &[
                "technology stack and hosting environment",
                "non-functional requirements such as performance and security",
                "testing, release and warranty expectations",
                "integration with existing systems",
            ],
            ProjectType::Consulting => &[
                "decision makers and sign-off process",
                "format and depth of recommendations",
                "access to client staff and data",
            ],
            ProjectType::Training => &[
                "audience size and skill level",
                "delivery format and materials ownership",
                "evaluation of learning outcomes",
            ],
            ProjectType::Infrastructure => &[
                "current environment inventory",
                "maintenance windows and downtime tolerance",
                "security and compliance constraints",
            ],
            ProjectType::Default => &[
                "stakeholders and approval process",
                "communication cadence",
                "acceptance of deliverables",
            ],
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project type with the most keyword hits over section names and text.
///
/// Ties go to the earlier type; no hits at all is `Default`.
pub fn classify(sections: &[Section]) -> ProjectType {
    let text = sections
        .iter()
        .map(|s| format!("{} {}", s.name, s.content))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut best = (ProjectType::Default, 0usize);
    for (project_type, keywords) in SIGNALS {
        let hits: usize = keywords.iter().map(|k| text.matches(k).count()).sum();
        if hits > best.1 {
            best = (*project_type, hits);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_software_project() {
        let sections = vec![Section::new(
            "Scope of Work",
            "Develop a web portal and a mobile application backed by a database",
        )];
        assert_eq!(classify(&sections), ProjectType::SoftwareDevelopment);
    }

    #[test]
    fn test_classify_training_project() {
        let sections = vec![Section::new(
            "Deliverables",
            "Three onsite workshops and a training curriculum for new staff",
        )];
        assert_eq!(classify(&sections), ProjectType::Training);
    }

    #[test]
    fn test_classify_without_signals_is_default() {
        let sections = vec![Section::new("Pricing", "Fixed fee payable monthly")];
        assert_eq!(classify(&sections), ProjectType::Default);
        assert_eq!(classify(&[]), ProjectType::Default);
    }
}
