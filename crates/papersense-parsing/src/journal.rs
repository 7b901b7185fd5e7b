use std::fmt;
use std::str::FromStr;

/// Journals with a built-in layout profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Journal {
    OrgSci,
    AnnRev,
    Aom,
    Asq,
    Jom,
    Joap,
    Personnel,
}

impl Journal {
    pub const ALL: [Journal; 7] = [
        Journal::OrgSci,
        Journal::AnnRev,
        Journal::Aom,
        Journal::Asq,
        Journal::Jom,
        Journal::Joap,
        Journal::Personnel,
    ];

    /// Short identifier used on the command line and in config files.
    pub fn id(&self) -> &'static str {
        match self {
            Journal::OrgSci => "orgsci",
            Journal::AnnRev => "annrev",
            Journal::Aom => "aom",
            Journal::Asq => "asq",
            Journal::Jom => "jom",
            Journal::Joap => "joap",
            Journal::Personnel => "personnel",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Journal::OrgSci => "Organization Science",
            Journal::AnnRev => "Annual Review of Organizational Psychology and Organizational Behavior",
            Journal::Aom => "Academy of Management Journal",
            Journal::Asq => "Administrative Science Quarterly",
            Journal::Jom => "Journal of Management",
            Journal::Joap => "Journal of Applied Psychology",
            Journal::Personnel => "Personnel Psychology",
        }
    }
}

impl fmt::Display for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownJournal(pub String);

impl fmt::Display for UnknownJournal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = Journal::ALL.iter().map(|j| j.id()).collect();
        write!(
            f,
            "unknown journal '{}' (expected one of: {})",
            self.0,
            known.join(", ")
        )
    }
}

impl std::error::Error for UnknownJournal {}

impl FromStr for Journal {
    type Err = UnknownJournal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "orgsci" | "organizationscience" => Ok(Journal::OrgSci),
            "annrev" | "annualreview" => Ok(Journal::AnnRev),
            "aom" | "amj" | "academyofmanagement" => Ok(Journal::Aom),
            "asq" | "administrativesciencequarterly" => Ok(Journal::Asq),
            "jom" | "journalofmanagement" => Ok(Journal::Jom),
            "joap" | "jap" | "journalofappliedpsychology" => Ok(Journal::Joap),
            "personnel" | "personnelpsychology" | "peps" => Ok(Journal::Personnel),
            _ => Err(UnknownJournal(s.to_string())),
        }
    }
}
