//! Metadata document schema.
//!
//! A submission document carries the management API location, the
//! credentials to use against it, and ten payload blocks that are forwarded
//! verbatim. Payload contents belong to the management API and are never
//! interpreted here beyond "is a mapping".

use std::fmt;

use serde::Deserialize;

use crate::error::ValidationError;

/// Opaque JSON object forwarded as a request body.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Credentials for the management API (`auth` in the document).
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Pre-encoded Basic credential sent as `Authorization: Basic <auth_string>`.
    #[serde(default)]
    pub auth_string: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_string", &self.auth_string.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A parsed and validated metadata document.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionDocument {
    pub base_url: String,
    pub auth: Credentials,
    pub catalog: Payload,
    pub representation: Payload,
    pub offer: Payload,
    pub resource_catalog: Payload,
    pub representation_resource: Payload,
    pub contract: Payload,
    pub rule: Payload,
    pub rule_contract: Payload,
    pub artifact: Payload,
    pub artifact_representation: Payload,
}

/// Names one of the ten payload blocks of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadBlock {
    Catalog,
    Representation,
    Offer,
    ResourceCatalog,
    RepresentationResource,
    Contract,
    Rule,
    RuleContract,
    Artifact,
    ArtifactRepresentation,
}

impl PayloadBlock {
    /// Key of the block in the YAML document.
    pub fn key(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Representation => "representation",
            Self::Offer => "offer",
            Self::ResourceCatalog => "resource_catalog",
            Self::RepresentationResource => "representation_resource",
            Self::Contract => "contract",
            Self::Rule => "rule",
            Self::RuleContract => "rule_contract",
            Self::Artifact => "artifact",
            Self::ArtifactRepresentation => "artifact_representation",
        }
    }
}

impl SubmissionDocument {
    /// Parse uploaded bytes as YAML and validate them against the schema.
    ///
    /// Merge keys (`<<: *anchor`) are resolved before validation. Unknown
    /// top-level keys are ignored.
    pub fn from_yaml_slice(content: &[u8]) -> Result<Self, ValidationError> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Err(ValidationError::EmptyUpload);
        }
        let mut value: serde_yaml::Value = serde_yaml::from_slice(content)?;
        value.apply_merge()?;
        Ok(serde_yaml::from_value(value)?)
    }

    pub fn payload(&self, block: PayloadBlock) -> &Payload {
        match block {
            PayloadBlock::Catalog => &self.catalog,
            PayloadBlock::Representation => &self.representation,
            PayloadBlock::Offer => &self.offer,
            PayloadBlock::ResourceCatalog => &self.resource_catalog,
            PayloadBlock::RepresentationResource => &self.representation_resource,
            PayloadBlock::Contract => &self.contract,
            PayloadBlock::Rule => &self.rule,
            PayloadBlock::RuleContract => &self.rule_contract,
            PayloadBlock::Artifact => &self.artifact,
            PayloadBlock::ArtifactRepresentation => &self.artifact_representation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../tests/fixtures/metadata.yaml");

    fn without_key(yaml: &str, key: &str) -> String {
        let mut doc: serde_yaml::Mapping = serde_yaml::from_str(yaml).unwrap();
        doc.remove(key);
        serde_yaml::to_string(&doc).unwrap()
    }

    #[test]
    fn test_parse_sample_document() {
        let doc = SubmissionDocument::from_yaml_slice(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.base_url, "https://connector.example.test");
        assert_eq!(doc.auth.username, "admin");
        assert!(doc.auth.auth_string.is_none());
        assert_eq!(doc.catalog["title"], "Mobility data");
        assert_eq!(doc.offer["keywords"][1], "mobility");
        assert_eq!(doc.artifact["automatedDownload"], false);
        assert_eq!(
            doc.payload(PayloadBlock::RuleContract)["relation"],
            "contract-rule"
        );
    }

    #[test]
    fn test_auth_string_is_optional_but_read_when_present() {
        let yaml = SAMPLE.replace(
            "  password: password\n",
            "  password: password\n  auth_string: dGVzdDp0ZXN0\n",
        );
        let doc = SubmissionDocument::from_yaml_slice(yaml.as_bytes()).unwrap();
        assert_eq!(doc.auth.auth_string.as_deref(), Some("dGVzdDp0ZXN0"));
    }

    #[test]
    fn test_missing_required_fields_are_rejected() {
        let blocks = [
            PayloadBlock::Catalog,
            PayloadBlock::Representation,
            PayloadBlock::Offer,
            PayloadBlock::ResourceCatalog,
            PayloadBlock::RepresentationResource,
            PayloadBlock::Contract,
            PayloadBlock::Rule,
            PayloadBlock::RuleContract,
            PayloadBlock::Artifact,
            PayloadBlock::ArtifactRepresentation,
        ];
        let keys = ["base_url", "auth"]
            .into_iter()
            .chain(blocks.iter().map(|b| b.key()));
        for key in keys {
            let yaml = without_key(SAMPLE, key);
            let err = SubmissionDocument::from_yaml_slice(yaml.as_bytes()).unwrap_err();
            assert!(
                err.to_string().contains(key),
                "error for missing `{key}` was: {err}"
            );
        }
    }

    #[test]
    fn test_missing_password_is_rejected() {
        let yaml = SAMPLE.replace("  password: password\n", "");
        let err = SubmissionDocument::from_yaml_slice(yaml.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_payload_block_must_be_a_mapping() {
        let yaml = SAMPLE.replace(
            "rule_contract:\n  relation: contract-rule\n",
            "rule_contract:\n  - contract-rule\n",
        );
        let err = SubmissionDocument::from_yaml_slice(yaml.as_bytes()).unwrap_err();
        assert!(matches!(err, ValidationError::Document(_)));
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let err = SubmissionDocument::from_yaml_slice(b"base_url: [unclosed\n").unwrap_err();
        assert!(matches!(err, ValidationError::Document(_)));
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        assert!(matches!(
            SubmissionDocument::from_yaml_slice(b"  \n"),
            Err(ValidationError::EmptyUpload)
        ));
    }

    #[test]
    fn test_merge_keys_are_resolved_into_blocks() {
        let yaml = format!(
            "shared: &shared\n  publisher: city\n  title: Shared title\n{}",
            SAMPLE.replace(
                "catalog:\n  title: Mobility data\n",
                "catalog:\n  <<: *shared\n  title: Mobility data\n",
            )
        );
        let doc = SubmissionDocument::from_yaml_slice(yaml.as_bytes()).unwrap();

        assert_eq!(doc.catalog["publisher"], "city");
        // Keys written in the block win over merged ones.
        assert_eq!(doc.catalog["title"], "Mobility data");
        assert!(!doc.catalog.contains_key("<<"));
    }

    #[test]
    fn test_unknown_top_level_keys_are_ignored() {
        let yaml = format!("{SAMPLE}comment: not part of the schema\n");
        assert!(SubmissionDocument::from_yaml_slice(yaml.as_bytes()).is_ok());
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let creds = Credentials {
            username: "admin".into(),
            password: "hunter2".into(),
            auth_string: Some("YWRtaW46aHVudGVyMg==".into()),
        };
        let printed = format!("{creds:?}");
        assert!(printed.contains("admin"));
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("YWRtaW46aHVudGVyMg=="));
    }
}
