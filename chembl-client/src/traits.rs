//! Collaborator interfaces consumed by the tool adapters.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result alias used by collaborator clients.
pub type ClientResult<T> = Result<T, ClientError>;

/// One record returned by the data service.
pub type Record = Map<String, Value>;

/// Errors raised by collaborator clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client is misconfigured.
    #[error("client not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// Network or protocol failure.
    #[error("transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// The upstream did not answer in time.
    #[error("upstream request timed out after {}ms", .after.as_millis())]
    TimedOut {
        /// Configured request timeout.
        after: Duration,
    },

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// Upstream answered with a body that could not be interpreted.
    #[error("unexpected upstream response: {reason}")]
    Response {
        /// Additional context about the response failure.
        reason: String,
    },
}

impl ClientError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for malformed responses.
    #[must_use]
    pub fn response(reason: impl Into<String>) -> Self {
        Self::Response {
            reason: reason.into(),
        }
    }
}

macro_rules! resources {
    ($($variant:ident => $path:literal),+ $(,)?) => {
        /// Entity collections exposed by the data service.
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
        pub enum Resource {
            $(
                #[doc = concat!("The `", $path, "` collection.")]
                $variant,
            )+
        }

        impl Resource {
            /// Every known resource, in declaration order.
            pub const ALL: &'static [Resource] = &[$(Resource::$variant),+];

            /// Returns the URL path segment of the collection.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $path,)+
                }
            }
        }
    };
}

resources! {
    Activity => "activity",
    ActivitySupplementaryDataByActivity => "activity_supplementary_data_by_activity",
    Assay => "assay",
    AssayClass => "assay_class",
    AtcClass => "atc_class",
    BindingSite => "binding_site",
    Biotherapeutic => "biotherapeutic",
    CellLine => "cell_line",
    ChemblIdLookup => "chembl_id_lookup",
    ChemblRelease => "chembl_release",
    CompoundRecord => "compound_record",
    CompoundStructuralAlert => "compound_structural_alert",
    Description => "description",
    Document => "document",
    Drug => "drug",
    DrugIndication => "drug_indication",
    DrugWarning => "drug_warning",
    GoSlim => "go_slim",
    Mechanism => "mechanism",
    Molecule => "molecule",
    MoleculeForm => "molecule_form",
    Organism => "organism",
    ProteinClassification => "protein_classification",
    Source => "source",
    Target => "target",
    TargetComponent => "target_component",
    TargetRelation => "target_relation",
    Tissue => "tissue",
    XrefSource => "xref_source",
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cheminformatics functions offered by the utility service.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum UtilityFunction {
    /// Canonical SMILES for a SMILES string.
    CanonicalizeSmiles,
    /// ChEMBL-specific descriptor set.
    ChemblDescriptors,
    /// Textual description of a compound.
    Description,
    /// Generic molecular descriptors.
    Descriptors,
    /// Parent compound of a salt or mixture.
    GetParent,
    /// SVG depiction with a highlighted fragment.
    HighlightSmilesFragmentSvg,
    /// `InChI` to `InChIKey`.
    InchiToInchiKey,
    /// `InChI` to SVG depiction.
    InchiToSvg,
    /// Whether a structure carries 3D coordinates.
    Is3D,
    /// Official representation of a compound.
    Official,
    /// Strip explicit hydrogens.
    RemoveHs,
    /// SMILES to `InChI`.
    SmilesToInchi,
    /// SMILES to `InChIKey`.
    SmilesToInchiKey,
    /// SMILES to SVG depiction.
    SmilesToSvg,
    /// ChEMBL structure standardisation.
    Standardize,
    /// Web-service status report.
    Status,
    /// Structural alerts matched by a structure.
    StructuralAlerts,
}

impl UtilityFunction {
    /// Returns the endpoint name used by the utility service.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::CanonicalizeSmiles => "canonicalizeSmiles",
            Self::ChemblDescriptors => "chemblDescriptors",
            Self::Description => "description",
            Self::Descriptors => "descriptors",
            Self::GetParent => "getParent",
            Self::HighlightSmilesFragmentSvg => "highlightSmilesFragmentSvg",
            Self::InchiToInchiKey => "inchi2inchiKey",
            Self::InchiToSvg => "inchi2svg",
            Self::Is3D => "is3D",
            Self::Official => "official",
            Self::RemoveHs => "removeHs",
            Self::SmilesToInchi => "smiles2inchi",
            Self::SmilesToInchiKey => "smiles2inchiKey",
            Self::SmilesToSvg => "smiles2svg",
            Self::Standardize => "standardize",
            Self::Status => "status",
            Self::StructuralAlerts => "structuralAlerts",
        }
    }
}

impl fmt::Display for UtilityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Query interface of the remote data service.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Returns records of `resource` matching every `(field, value)` pair.
    async fn filter(&self, resource: Resource, criteria: &[(String, Value)])
    -> ClientResult<Vec<Record>>;

    /// Returns records of `resource` without filtering.
    async fn all(&self, resource: Resource) -> ClientResult<Vec<Record>>;
}

/// Call interface of the cheminformatics utility service.
#[async_trait]
pub trait ChemUtilities: Send + Sync {
    /// Calls `function` with named inputs in declared order.
    async fn call(&self, function: UtilityFunction, inputs: &[(String, Value)])
    -> ClientResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_paths_are_unique() {
        let mut paths: Vec<&str> = Resource::ALL.iter().map(|r| r.as_str()).collect();
        let total = paths.len();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), total);
        assert_eq!(Resource::XrefSource.to_string(), "xref_source");
    }

    #[test]
    fn utility_endpoints_use_service_names() {
        assert_eq!(UtilityFunction::InchiToInchiKey.endpoint(), "inchi2inchiKey");
        assert_eq!(UtilityFunction::Is3D.to_string(), "is3D");
    }

    #[test]
    fn timeout_message_reports_millis() {
        let err = ClientError::TimedOut {
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "upstream request timed out after 1500ms");
    }
}
