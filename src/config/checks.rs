//! Check document loading and validation.
//!
//! The check document is a YAML file with two optional lists, `certificates`
//! and `domains`. Every optional field disables its assertion when unset.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::checks::ExpiryThresholds;
use crate::config::constants::{MAX_THRESHOLD_DAYS, MAX_THRESHOLD_PERCENT};
use crate::error_handling::ConfigurationError;
use crate::tls::Endpoint;

fn default_true() -> bool {
    true
}

/// Expectations for the certificate served by a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificateCheckSpec {
    /// Site URL (or bare domain) whose certificate is fetched
    pub site: String,
    /// Additional sites the same certificate must be valid for
    #[serde(default)]
    pub should_match_sites: Option<Vec<String>>,
    /// Fail this many days before `notAfter`
    #[serde(default)]
    pub expiration_threshold_days: Option<u32>,
    /// Fail when this percentage of the validity period remains
    #[serde(default)]
    pub expiration_threshold_relative: Option<u32>,
    /// Expected issuer organization name (case-insensitive)
    #[serde(default)]
    pub expected_issuer_organisation_name: Option<String>,
    /// Validate the presented chain against the trust store
    #[serde(default = "default_true")]
    pub verify_chain: bool,
}

impl CertificateCheckSpec {
    /// Creates a spec for `site` with every optional assertion disabled
    /// except chain verification.
    pub fn for_site(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            should_match_sites: None,
            expiration_threshold_days: None,
            expiration_threshold_relative: None,
            expected_issuer_organisation_name: None,
            verify_chain: true,
        }
    }

    /// Expiry thresholds configured for this check.
    pub fn thresholds(&self) -> ExpiryThresholds {
        ExpiryThresholds {
            days: self.expiration_threshold_days,
            percent: self.expiration_threshold_relative,
        }
    }

    /// The primary site followed by every additional site.
    pub fn all_sites(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.site.as_str()).chain(
            self.should_match_sites
                .iter()
                .flatten()
                .map(String::as_str),
        )
    }
}

/// Expectations for a domain's registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainCheckSpec {
    /// Registrable domain name
    pub domain: String,
    /// Fail this many days before the registration expires
    #[serde(default)]
    pub expiration_threshold_days: Option<u32>,
    /// Fail when this percentage of the registration period remains
    #[serde(default)]
    pub expiration_threshold_relative: Option<u32>,
    /// Name servers the registration must list (order-insensitive)
    #[serde(default)]
    pub expected_name_servers: Option<Vec<String>>,
    /// Expected registrar name (case-insensitive)
    #[serde(default)]
    pub expected_registrar_name: Option<String>,
}

impl DomainCheckSpec {
    /// Creates a spec for `domain` with every optional assertion disabled.
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            expiration_threshold_days: None,
            expiration_threshold_relative: None,
            expected_name_servers: None,
            expected_registrar_name: None,
        }
    }

    /// Expiry thresholds configured for this check.
    pub fn thresholds(&self) -> ExpiryThresholds {
        ExpiryThresholds {
            days: self.expiration_threshold_days,
            percent: self.expiration_threshold_relative,
        }
    }
}

/// The full check document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckDocument {
    /// Free-form document version
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    certificates: Option<Vec<CertificateCheckSpec>>,
    #[serde(default)]
    domains: Option<Vec<DomainCheckSpec>>,
    /// Older documents nest both lists under `detect_kit:`
    #[serde(default, skip_serializing)]
    detect_kit: Option<NestedChecks>,
}

/// The `detect_kit:` section of older check documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct NestedChecks {
    #[serde(default)]
    certificates: Option<Vec<CertificateCheckSpec>>,
    #[serde(default)]
    domains: Option<Vec<DomainCheckSpec>>,
}

impl CheckDocument {
    /// Builds a document from check lists.
    pub fn new(certificates: Vec<CertificateCheckSpec>, domains: Vec<DomainCheckSpec>) -> Self {
        Self {
            version: None,
            certificates: Some(certificates),
            domains: Some(domains),
            detect_kit: None,
        }
    }

    /// Moves checks from a `detect_kit:` section into the top-level lists,
    /// after any checks already listed there.
    fn flatten(mut self) -> Self {
        if let Some(nested) = self.detect_kit.take() {
            if let Some(certificates) = nested.certificates {
                self.certificates
                    .get_or_insert_with(Vec::new)
                    .extend(certificates);
            }
            if let Some(domains) = nested.domains {
                self.domains.get_or_insert_with(Vec::new).extend(domains);
            }
        }
        self
    }

    /// Certificate checks, in document order.
    pub fn certificates(&self) -> &[CertificateCheckSpec] {
        self.certificates.as_deref().unwrap_or_default()
    }

    /// Domain checks, in document order.
    pub fn domains(&self) -> &[DomainCheckSpec] {
        self.domains.as_deref().unwrap_or_default()
    }

    /// Rejects values the runner cannot evaluate.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for check in self.certificates() {
            validate_thresholds(&check.site, &check.thresholds())?;
            for site in check.all_sites() {
                Endpoint::from_site(site).map_err(|reason| ConfigurationError::InvalidValue {
                    check: check.site.clone(),
                    field: "site",
                    reason,
                })?;
            }
        }
        for check in self.domains() {
            if check.domain.trim().is_empty() {
                return Err(ConfigurationError::InvalidValue {
                    check: "<domains>".to_string(),
                    field: "domain",
                    reason: "must not be empty".to_string(),
                });
            }
            validate_thresholds(&check.domain, &check.thresholds())?;
        }
        Ok(())
    }
}

fn validate_thresholds(check: &str, thresholds: &ExpiryThresholds) -> Result<(), ConfigurationError> {
    if let Some(days) = thresholds.days {
        if days == 0 || days > MAX_THRESHOLD_DAYS {
            return Err(ConfigurationError::InvalidValue {
                check: check.to_string(),
                field: "expiration_threshold_days",
                reason: format!("{days} is outside 1..={MAX_THRESHOLD_DAYS}"),
            });
        }
    }
    if let Some(percent) = thresholds.percent {
        if percent == 0 || percent > MAX_THRESHOLD_PERCENT {
            return Err(ConfigurationError::InvalidValue {
                check: check.to_string(),
                field: "expiration_threshold_relative",
                reason: format!("{percent} is outside 1..={MAX_THRESHOLD_PERCENT}"),
            });
        }
    }
    Ok(())
}

/// Parses and validates a check document from YAML text.
pub fn parse_checks(yaml: &str) -> Result<CheckDocument, ConfigurationError> {
    // An empty file deserializes to unit, not to an empty document.
    if yaml.trim().is_empty() {
        return Ok(CheckDocument::default());
    }
    let document = serde_yaml::from_str::<CheckDocument>(yaml)?.flatten();
    document.validate()?;
    Ok(document)
}

/// Reads, parses and validates the check document at `path`.
pub fn load_checks(path: &Path) -> Result<CheckDocument, ConfigurationError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigurationError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let document = parse_checks(&yaml)?;
    info!(
        "Loaded {} certificate check(s) and {} domain check(s) from {}",
        document.certificates().len(),
        document.domains().len(),
        path.display()
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_DOCUMENT: &str = r#"
version: "1"
certificates:
  - site: https://python.org/
    should_match_sites:
      - https://www.python.org/
      - https://docs.python.org/
    expiration_threshold_days: 14
    expected_issuer_organisation_name: DigiCert Inc
  - site: https://expired.badssl.com/
    expiration_threshold_relative: 10
    verify_chain: false
domains:
  - domain: python.org
    expiration_threshold_days: 30
    expected_name_servers:
      - ns-2046.awsdns-63.co.uk
      - ns-484.awsdns-60.com
    expected_registrar_name: Gandi SAS
"#;

    #[test]
    fn test_parse_full_document() {
        let doc = parse_checks(FULL_DOCUMENT).unwrap();
        assert_eq!(doc.version.as_deref(), Some("1"));
        assert_eq!(doc.certificates().len(), 2);
        assert_eq!(doc.domains().len(), 1);

        let first = &doc.certificates()[0];
        assert_eq!(first.site, "https://python.org/");
        assert_eq!(first.all_sites().count(), 3);
        assert_eq!(first.thresholds().days, Some(14));
        assert_eq!(first.thresholds().percent, None);
        assert!(first.verify_chain);

        let second = &doc.certificates()[1];
        assert_eq!(second.thresholds().percent, Some(10));
        assert!(!second.verify_chain);
        assert!(second.expected_issuer_organisation_name.is_none());

        let domain = &doc.domains()[0];
        assert_eq!(domain.expected_name_servers.as_ref().map(Vec::len), Some(2));
        assert_eq!(domain.expected_registrar_name.as_deref(), Some("Gandi SAS"));
    }

    #[test]
    fn test_parse_detect_kit_document() {
        let yaml = r#"
version: "1"
detect_kit:
  certificates:
    - site: https://python.org/
      expiration_threshold_days: 14
  domains:
    - domain: python.org
      expected_registrar_name: Gandi SAS
"#;
        let doc = parse_checks(yaml).unwrap();
        assert_eq!(doc.version.as_deref(), Some("1"));
        assert_eq!(doc.certificates().len(), 1);
        assert_eq!(doc.certificates()[0].site, "https://python.org/");
        assert_eq!(doc.certificates()[0].thresholds().days, Some(14));
        assert_eq!(doc.domains().len(), 1);
        assert_eq!(doc.domains()[0].domain, "python.org");
    }

    #[test]
    fn test_detect_kit_checks_follow_top_level_checks() {
        let yaml = r#"
certificates:
  - site: https://first.example/
detect_kit:
  certificates:
    - site: https://second.example/
"#;
        let doc = parse_checks(yaml).unwrap();
        let sites: Vec<&str> = doc.certificates().iter().map(|c| c.site.as_str()).collect();
        assert_eq!(sites, vec!["https://first.example/", "https://second.example/"]);
        assert!(doc.domains().is_empty());
    }

    #[test]
    fn test_detect_kit_section_is_validated() {
        let out_of_range = "detect_kit:\n  domains:\n    - domain: python.org\n      expiration_threshold_days: 400\n";
        assert!(matches!(
            parse_checks(out_of_range),
            Err(ConfigurationError::InvalidValue { .. })
        ));

        let unknown = "detect_kit:\n  checks: []\n";
        assert!(parse_checks(unknown).is_err());
    }

    #[test]
    fn test_parse_empty_document() {
        let doc = parse_checks("").unwrap();
        assert!(doc.certificates().is_empty());
        assert!(doc.domains().is_empty());

        let doc = parse_checks("certificates:\ndomains:\n").unwrap();
        assert!(doc.certificates().is_empty());
        assert!(doc.domains().is_empty());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let yaml = "certificates:\n  - site: https://example.com/\n    expiration_threshold_days: 400\n";
        let err = parse_checks(yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidValue {
                field: "expiration_threshold_days",
                ..
            }
        ));

        let yaml = "domains:\n  - domain: example.com\n    expiration_threshold_relative: 0\n";
        let err = parse_checks(yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidValue {
                field: "expiration_threshold_relative",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "certificates:\n  - site: https://example.com/\n    expected_issuer: Someone\n";
        assert!(matches!(
            parse_checks(yaml),
            Err(ConfigurationError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_invalid_site_rejected() {
        let yaml = "certificates:\n  - site: \"https://exa mple.com/\"\n";
        assert!(matches!(
            parse_checks(yaml),
            Err(ConfigurationError::InvalidValue { field: "site", .. })
        ));
    }

    #[test]
    fn test_empty_domain_rejected() {
        let yaml = "domains:\n  - domain: \"  \"\n";
        assert!(matches!(
            parse_checks(yaml),
            Err(ConfigurationError::InvalidValue { field: "domain", .. })
        ));
    }

    #[test]
    fn test_load_checks_missing_file() {
        let err = load_checks(Path::new("/nonexistent/checks.yaml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::ReadConfig { .. }));
    }

    #[test]
    fn test_load_checks_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checks.yaml");
        std::fs::write(&path, FULL_DOCUMENT).unwrap();
        let doc = load_checks(&path).unwrap();
        assert_eq!(doc.certificates().len(), 2);
    }
}
