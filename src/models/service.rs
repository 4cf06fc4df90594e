// src/models/service.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Service categories a review can be filed under.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(from = "String", into = "String")]
pub enum Service {
    CompanyFormation,
    GstRegistration,
    IncomeTaxFiling,
    AuditAndAssurance,
    AuditServices,
    BusinessLicense,
    TaxPlanning,
    #[default]
    Other,
}

impl Service {
    pub const ALL: [Service; 8] = [
        Service::CompanyFormation,
        Service::GstRegistration,
        Service::IncomeTaxFiling,
        Service::AuditAndAssurance,
        Service::AuditServices,
        Service::BusinessLicense,
        Service::TaxPlanning,
        Service::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Service::CompanyFormation => "Company Formation",
            Service::GstRegistration => "GST Registration",
            Service::IncomeTaxFiling => "Income Tax Filing",
            Service::AuditAndAssurance => "Audit & Assurance",
            Service::AuditServices => "Audit Services",
            Service::BusinessLicense => "Business License",
            Service::TaxPlanning => "Tax Planning",
            Service::Other => "Other Services",
        }
    }

    /// Parses a label; blank or unknown labels fall back to `Other`.
    pub fn from_label(label: &str) -> Service {
        let label = label.trim();
        Service::ALL
            .into_iter()
            .find(|s| s.label() == label)
            .unwrap_or_default()
    }
}

impl From<String> for Service {
    fn from(label: String) -> Self {
        Service::from_label(&label)
    }
}

impl From<Service> for String {
    fn from(service: Service) -> Self {
        service.label().to_string()
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
