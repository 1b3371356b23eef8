//! Deterministic stand-ins for the external collaborators.
//!
//! The CLI wires these in so a campaign can run end to end without network
//! access. Every call with the same inputs gives the same output.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use leadgen_shared::{
    Candidate, Contact, CrmProvider, CrmSyncSummary, OutreachProvider, OutreachSummary,
    ProspectProvider, QualificationLevel, QualifiedLead, Result,
};

// ---------------------------------------------------------------------------
// Prospects
// ---------------------------------------------------------------------------

/// Serves prospects from a fixed company catalog, in catalog order.
pub struct CatalogProspects {
    catalog: Vec<Candidate>,
    target_industry: Option<String>,
}

impl CatalogProspects {
    pub fn new(catalog: Vec<Candidate>) -> Self {
        Self {
            catalog,
            target_industry: None,
        }
    }

    /// The built-in sample catalog.
    pub fn sample() -> Self {
        Self::new(sample_catalog())
    }

    /// Only return companies in `industry` (case-insensitive).
    pub fn for_industry(mut self, industry: impl Into<String>) -> Self {
        self.target_industry = Some(industry.into());
        self
    }
}

#[async_trait]
impl ProspectProvider for CatalogProspects {
    fn name(&self) -> &str {
        "catalog"
    }

    async fn research(&self, target_count: u32) -> Result<Vec<Candidate>> {
        let found: Vec<Candidate> = self
            .catalog
            .iter()
            .filter(|c| {
                self.target_industry
                    .as_deref()
                    .is_none_or(|industry| c.industry.eq_ignore_ascii_case(industry))
            })
            .take(target_count as usize)
            .cloned()
            .collect();
        debug!(requested = target_count, found = found.len(), "catalog research");
        Ok(found)
    }
}

struct CatalogEntry {
    name: &'static str,
    size: u32,
    location: &'static str,
    domain: &'static str,
    description: &'static str,
    revenue: &'static str,
    technologies: &'static [&'static str],
    signals: &'static [&'static str],
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "TechCorp Solutions",
        size: 250,
        location: "San Francisco, CA, United States",
        domain: "techcorp.com",
        description: "Leading provider of cloud-based business solutions",
        revenue: "$50M-$100M",
        technologies: &["AWS", "React", "Node.js", "PostgreSQL"],
        signals: &["announces new product launch in Q1"],
    },
    CatalogEntry {
        name: "DataFlow Systems",
        size: 180,
        location: "Austin, TX, United States",
        domain: "dataflow.com",
        description: "AI-powered data analytics and visualization platform",
        revenue: "$25M-$50M",
        technologies: &["Python", "TensorFlow", "React", "MongoDB"],
        signals: &["secures $15M in Series B funding", "expands team with 25 new hires"],
    },
    CatalogEntry {
        name: "SecureNet Inc",
        size: 320,
        location: "Seattle, WA, United States",
        domain: "securenet.com",
        description: "Enterprise cybersecurity solutions and consulting",
        revenue: "$100M-$250M",
        technologies: &["Java", "Kubernetes", "Elasticsearch", "SIEM"],
        signals: &["partners with major tech company"],
    },
    CatalogEntry {
        name: "CloudFirst Technologies",
        size: 95,
        location: "Denver, CO, United States",
        domain: "cloudfirst.com",
        description: "Cloud migration and DevOps consulting services",
        revenue: "$10M-$25M",
        technologies: &["AWS", "Docker", "Terraform", "Jenkins"],
        signals: &[],
    },
    CatalogEntry {
        name: "InnovateLabs",
        size: 75,
        location: "Boston, MA, United States",
        domain: "innovatelabs.com",
        description: "Product innovation and UX design consultancy",
        revenue: "$5M-$10M",
        technologies: &["Figma", "Sketch", "React", "Firebase"],
        signals: &["recognized as top workplace in annual survey"],
    },
];

const CONTACTS: &[(&str, &str, &str)] = &[
    ("Sarah Johnson", "Chief Technology Officer", "sarah.johnson"),
    ("Michael Chen", "VP of Engineering", "michael.chen"),
    ("Jennifer Smith", "Director of Operations", "jennifer.smith"),
];

/// The five sample technology companies. Contact count cycles 1..=3 by position.
pub fn sample_catalog() -> Vec<Candidate> {
    CATALOG
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let slug = entry.name.to_lowercase().replace(' ', "-");
            let handle = entry.name.to_lowercase().replace(' ', "");
            let contacts = CONTACTS
                .iter()
                .take(i % CONTACTS.len() + 1)
                .map(|(name, title, local)| Contact {
                    name: (*name).to_string(),
                    title: (*title).to_string(),
                    email: Some(format!("{local}@{}", entry.domain)),
                })
                .collect();
            let social_profiles: BTreeMap<String, String> = [
                ("linkedin", format!("https://linkedin.com/company/{slug}")),
                ("twitter", format!("https://twitter.com/{handle}")),
                ("facebook", format!("https://facebook.com/{handle}")),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

            Candidate {
                id: slug,
                company_name: entry.name.to_string(),
                industry: "technology".to_string(),
                company_size: entry.size,
                revenue_range: Some(entry.revenue.to_string()),
                location: entry.location.to_string(),
                website: format!("https://{}", entry.domain),
                description: entry.description.to_string(),
                contacts,
                recent_signals: entry
                    .signals
                    .iter()
                    .map(|s| format!("{} {s}", entry.name))
                    .collect(),
                technologies: entry.technologies.iter().map(|t| t.to_string()).collect(),
                social_profiles,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Outreach
// ---------------------------------------------------------------------------

/// "Sends" one sequence per lead with a contact email.
///
/// Hot leads respond; every third response across the provider's lifetime
/// books a meeting.
#[derive(Default)]
pub struct SimulatedOutreach {
    responses: AtomicU64,
}

impl SimulatedOutreach {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OutreachProvider for SimulatedOutreach {
    fn name(&self) -> &str {
        "simulated-outreach"
    }

    async fn send_sequences(&self, leads: &[QualifiedLead]) -> Result<OutreachSummary> {
        let mut summary = OutreachSummary::default();
        for lead in leads {
            let has_email = lead
                .candidate
                .contacts
                .iter()
                .any(|c| c.email.as_deref().is_some_and(|e| e.contains('@')));
            if !has_email {
                summary.failed += 1;
                continue;
            }
            summary.sent += 1;

            if lead.score.qualification_level == QualificationLevel::Hot {
                summary.responses += 1;
                let total = self.responses.fetch_add(1, Ordering::SeqCst) + 1;
                if total % 3 == 0 {
                    summary.meetings_booked += 1;
                }
            }
        }
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// CRM
// ---------------------------------------------------------------------------

/// Remembers synced lead ids; a repeat id counts as a duplicate.
#[derive(Default)]
pub struct InMemoryCrm {
    synced: Mutex<HashSet<String>>,
}

impl InMemoryCrm {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn synced_count(&self) -> usize {
        self.synced.lock().await.len()
    }
}

#[async_trait]
impl CrmProvider for InMemoryCrm {
    fn name(&self) -> &str {
        "in-memory-crm"
    }

    async fn sync_leads(&self, leads: &[QualifiedLead]) -> Result<CrmSyncSummary> {
        let mut synced = self.synced.lock().await;
        let mut summary = CrmSyncSummary::default();
        for lead in leads {
            if synced.insert(lead.id().to_string()) {
                summary.successful_syncs += 1;
            } else {
                summary.duplicates_found += 1;
            }
        }
        Ok(summary)
    }
}
