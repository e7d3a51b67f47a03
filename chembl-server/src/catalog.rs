//! The ChEMBL operation catalog.
//!
//! Every operation forwards to exactly one collaborator call, so the catalog
//! is a table and a single [`ForwardingAdapter`] per row.

use std::sync::Arc;

use chembl_client::traits::{ChemUtilities, DataService, Resource, UtilityFunction};
use chembl_primitives::{OperationName, ParamSpec, ParamType, ResultShape};
use chembl_tools::{
    BoundArguments, DeadlinePolicy, ForwardFuture, ForwardingAdapter, Operation,
    OperationCategory, OperationDescriptor, OperationRegistry, OperationResult, RegistryError,
    RegistryResult,
};
use futures::FutureExt;
use serde_json::Value;

/// Collaborator call backing an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Filtered query against a data resource.
    Filter(Resource),
    /// Unfiltered query against a data resource.
    All(Resource),
    /// Cheminformatics utility call.
    Utility(UtilityFunction),
}

/// One row of the catalog.
#[derive(Clone, Copy, Debug)]
pub struct CatalogEntry {
    /// Operation name.
    pub name: &'static str,
    /// Text shown to the agent.
    pub description: &'static str,
    /// Required parameters in collaborator order.
    pub params: &'static [(&'static str, ParamType)],
    /// Declared result shape.
    pub returns: ResultShape,
    /// Collaborator call.
    pub target: Target,
}

impl CatalogEntry {
    /// Category implied by the target.
    #[must_use]
    pub const fn category(&self) -> OperationCategory {
        match self.target {
            Target::Filter(_) | Target::All(_) => OperationCategory::DataQuery,
            Target::Utility(_) => OperationCategory::Utility,
        }
    }

    fn descriptor(&self) -> RegistryResult<OperationDescriptor> {
        let name = OperationName::new(self.name).map_err(invalid)?;
        let mut builder = OperationDescriptor::builder(name, self.returns)
            .description(self.description)
            .category(self.category());
        for &(param, kind) in self.params {
            builder = builder.param(ParamSpec::required(param, kind).map_err(invalid)?);
        }
        builder.build()
    }
}

const fn query(
    name: &'static str,
    description: &'static str,
    params: &'static [(&'static str, ParamType)],
    resource: Resource,
) -> CatalogEntry {
    CatalogEntry {
        name,
        description,
        params,
        returns: ResultShape::Records,
        target: Target::Filter(resource),
    }
}

const fn util(
    name: &'static str,
    description: &'static str,
    params: &'static [(&'static str, ParamType)],
    returns: ResultShape,
    function: UtilityFunction,
) -> CatalogEntry {
    CatalogEntry {
        name,
        description,
        params,
        returns,
        target: Target::Utility(function),
    }
}

const SMILES: &[(&str, ParamType)] = &[("smiles", ParamType::String)];
const INCHI: &[(&str, ParamType)] = &[("inchi", ParamType::String)];
const CHEMBL_ID: &[(&str, ParamType)] = &[("chembl_id", ParamType::String)];

/// Every operation served, in discovery order.
pub const CATALOG: &[CatalogEntry] = &[
    query(
        "activity",
        "Activity records measured in an assay.",
        &[("assay_chembl_id", ParamType::String)],
        Resource::Activity,
    ),
    query(
        "activity_supplementary_data_by_activity",
        "Supplementary data attached to an activity.",
        &[("activity_chembl_id", ParamType::String)],
        Resource::ActivitySupplementaryDataByActivity,
    ),
    query(
        "assay",
        "Assays of the given type (B, F, A, T, P or U).",
        &[("assay_type", ParamType::String)],
        Resource::Assay,
    ),
    query(
        "assay_class",
        "Assay classifications of the given type.",
        &[("assay_class_type", ParamType::String)],
        Resource::AssayClass,
    ),
    query(
        "atc_class",
        "ATC classifications under a level-1 code.",
        &[("level1", ParamType::String)],
        Resource::AtcClass,
    ),
    query(
        "binding_site",
        "Binding sites matching a site name.",
        &[("site_name", ParamType::String)],
        Resource::BindingSite,
    ),
    query(
        "biotherapeutic",
        "Biotherapeutics of the given type.",
        &[("biotherapeutic_type", ParamType::String)],
        Resource::Biotherapeutic,
    ),
    query(
        "cell_line",
        "Cell lines matching a name.",
        &[("cell_line_name", ParamType::String)],
        Resource::CellLine,
    ),
    query(
        "chembl_id_lookup",
        "Look up ChEMBL identifiers by entity type and query string.",
        &[("available_type", ParamType::String), ("q", ParamType::String)],
        Resource::ChemblIdLookup,
    ),
    CatalogEntry {
        name: "chembl_release",
        description: "ChEMBL release history.",
        params: &[],
        returns: ResultShape::Records,
        target: Target::All(Resource::ChemblRelease),
    },
    query(
        "compound_record",
        "Compound records matching a compound name.",
        &[("compound_name", ParamType::String)],
        Resource::CompoundRecord,
    ),
    query(
        "compound_structural_alert",
        "Compounds matching a structural alert name.",
        &[("alert_name", ParamType::String)],
        Resource::CompoundStructuralAlert,
    ),
    query(
        "description",
        "Descriptions of the given type.",
        &[("description_type", ParamType::String)],
        Resource::Description,
    ),
    query(
        "document",
        "Documents published in a journal.",
        &[("journal", ParamType::String)],
        Resource::Document,
    ),
    query(
        "drug",
        "Approved drugs of the given type.",
        &[("drug_type", ParamType::String)],
        Resource::Drug,
    ),
    query(
        "drug_indication",
        "Drug indications for a MeSH heading.",
        &[("mesh_heading", ParamType::String)],
        Resource::DrugIndication,
    ),
    query(
        "drug_warning",
        "Drug warnings for a MedDRA term.",
        &[("meddra_term", ParamType::String)],
        Resource::DrugWarning,
    ),
    query(
        "go_slim",
        "GO slim terms matching a term.",
        &[("go_slim_term", ParamType::String)],
        Resource::GoSlim,
    ),
    query(
        "mechanism",
        "Drug mechanisms with the given mechanism of action.",
        &[("mechanism_of_action", ParamType::String)],
        Resource::Mechanism,
    ),
    query(
        "molecule",
        "Molecules of the given type.",
        &[("molecule_type", ParamType::String)],
        Resource::Molecule,
    ),
    query(
        "molecule_form",
        "Molecule forms matching a form description.",
        &[("form_description", ParamType::String)],
        Resource::MoleculeForm,
    ),
    query(
        "organism",
        "Organisms with the given NCBI taxonomy id.",
        &[("tax_id", ParamType::Integer)],
        Resource::Organism,
    ),
    query(
        "protein_classification",
        "Protein classifications matching a class name.",
        &[("protein_class_name", ParamType::String)],
        Resource::ProteinClassification,
    ),
    query(
        "source",
        "Data sources matching a description.",
        &[("source_description", ParamType::String)],
        Resource::Source,
    ),
    query(
        "target",
        "Targets of the given type.",
        &[("target_type", ParamType::String)],
        Resource::Target,
    ),
    query(
        "target_component",
        "Target components of the given type.",
        &[("component_type", ParamType::String)],
        Resource::TargetComponent,
    ),
    query(
        "target_relation",
        "Target relations of the given relationship type.",
        &[("relationship_type", ParamType::String)],
        Resource::TargetRelation,
    ),
    query(
        "tissue",
        "Tissues matching a name.",
        &[("tissue_name", ParamType::String)],
        Resource::Tissue,
    ),
    query(
        "xref_source",
        "Cross-reference sources matching a name.",
        &[("xref_name", ParamType::String)],
        Resource::XrefSource,
    ),
    util(
        "canonicalize_smiles",
        "Canonical form of a SMILES string.",
        SMILES,
        ResultShape::Text,
        UtilityFunction::CanonicalizeSmiles,
    ),
    util(
        "chembl_descriptors",
        "ChEMBL-specific descriptors of a structure.",
        SMILES,
        ResultShape::Mapping,
        UtilityFunction::ChemblDescriptors,
    ),
    util(
        "compound_description",
        "Textual description of a compound.",
        CHEMBL_ID,
        ResultShape::Text,
        UtilityFunction::Description,
    ),
    util(
        "descriptors",
        "Molecular descriptors of a structure.",
        SMILES,
        ResultShape::Mapping,
        UtilityFunction::Descriptors,
    ),
    util(
        "get_parent",
        "Parent compound of a salt or mixture.",
        CHEMBL_ID,
        ResultShape::Text,
        UtilityFunction::GetParent,
    ),
    util(
        "highlight_smiles_fragment_svg",
        "SVG depiction of a structure with a fragment highlighted.",
        &[("smiles", ParamType::String), ("fragment", ParamType::String)],
        ResultShape::Text,
        UtilityFunction::HighlightSmilesFragmentSvg,
    ),
    util(
        "inchi_to_inchi_key",
        "InChIKey for an InChI.",
        INCHI,
        ResultShape::Text,
        UtilityFunction::InchiToInchiKey,
    ),
    util(
        "inchi_to_svg",
        "SVG depiction of an InChI.",
        INCHI,
        ResultShape::Text,
        UtilityFunction::InchiToSvg,
    ),
    util(
        "is_3d",
        "Whether a structure carries 3D coordinates.",
        SMILES,
        ResultShape::Boolean,
        UtilityFunction::Is3D,
    ),
    util(
        "official",
        "Official representation of a compound.",
        CHEMBL_ID,
        ResultShape::Text,
        UtilityFunction::Official,
    ),
    util(
        "remove_hs",
        "Structure with explicit hydrogens removed.",
        SMILES,
        ResultShape::Text,
        UtilityFunction::RemoveHs,
    ),
    util(
        "smiles_to_inchi",
        "InChI for a SMILES string.",
        SMILES,
        ResultShape::Text,
        UtilityFunction::SmilesToInchi,
    ),
    util(
        "smiles_to_inchi_key",
        "InChIKey for a SMILES string.",
        SMILES,
        ResultShape::Text,
        UtilityFunction::SmilesToInchiKey,
    ),
    util(
        "smiles_to_svg",
        "SVG depiction of a SMILES string.",
        SMILES,
        ResultShape::Text,
        UtilityFunction::SmilesToSvg,
    ),
    util(
        "standardize",
        "ChEMBL-standardised form of a structure.",
        SMILES,
        ResultShape::Records,
        UtilityFunction::Standardize,
    ),
    util(
        "status",
        "Status of the ChEMBL web services.",
        &[],
        ResultShape::Mapping,
        UtilityFunction::Status,
    ),
    util(
        "structural_alerts",
        "Structural alerts matched by a structure.",
        SMILES,
        ResultShape::Records,
        UtilityFunction::StructuralAlerts,
    ),
];

/// Builds the registry serving every [`CATALOG`] entry.
///
/// # Errors
///
/// Returns [`RegistryError`] if an entry is malformed or duplicated.
pub fn build_registry(
    data: Arc<dyn DataService>,
    utilities: Arc<dyn ChemUtilities>,
    deadlines: DeadlinePolicy,
) -> RegistryResult<OperationRegistry> {
    let mut builder = OperationRegistry::builder(deadlines);
    for entry in CATALOG {
        let descriptor = entry.descriptor()?;
        let handler = adapter_for(entry.target, &descriptor, &data, &utilities);
        builder.register_shared(descriptor, None, handler)?;
    }
    Ok(builder.build())
}

fn adapter_for(
    target: Target,
    descriptor: &OperationDescriptor,
    data: &Arc<dyn DataService>,
    utilities: &Arc<dyn ChemUtilities>,
) -> Arc<dyn Operation> {
    match target {
        Target::Filter(resource) => {
            let data = Arc::clone(data);
            Arc::new(ForwardingAdapter::for_descriptor(
                descriptor,
                move |args: BoundArguments| -> ForwardFuture {
                    filter(Arc::clone(&data), resource, args).boxed()
                },
            ))
        }
        Target::All(resource) => {
            let data = Arc::clone(data);
            Arc::new(ForwardingAdapter::for_descriptor(
                descriptor,
                move |_: BoundArguments| -> ForwardFuture {
                    all(Arc::clone(&data), resource).boxed()
                },
            ))
        }
        Target::Utility(function) => {
            let utilities = Arc::clone(utilities);
            Arc::new(ForwardingAdapter::for_descriptor(
                descriptor,
                move |args: BoundArguments| -> ForwardFuture {
                    utility(Arc::clone(&utilities), function, args).boxed()
                },
            ))
        }
    }
}

async fn filter(
    data: Arc<dyn DataService>,
    resource: Resource,
    args: BoundArguments,
) -> OperationResult {
    let criteria = args.into_pairs();
    let records = data.filter(resource, &criteria).await?;
    Ok(Value::Array(records.into_iter().map(Value::Object).collect()))
}

async fn all(data: Arc<dyn DataService>, resource: Resource) -> OperationResult {
    let records = data.all(resource).await?;
    Ok(Value::Array(records.into_iter().map(Value::Object).collect()))
}

async fn utility(
    utilities: Arc<dyn ChemUtilities>,
    function: UtilityFunction,
    args: BoundArguments,
) -> OperationResult {
    let inputs = args.into_pairs();
    Ok(utilities.call(function, &inputs).await?)
}

fn invalid(err: chembl_primitives::Error) -> RegistryError {
    RegistryError::InvalidDescriptor {
        reason: err.to_string(),
    }
}
