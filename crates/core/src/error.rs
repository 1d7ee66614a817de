/// Errors surfaced to the hosting screen (configuration, input loading).
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("OpenMRS payload error: {0}")]
    Openmrs(#[from] openmrs::OpenmrsError),
    #[error("invalid value: {0}")]
    Types(#[from] obsview_types::TypesError),
}

pub type ViewResult<T> = std::result::Result<T, ViewError>;

/// A fault while extracting one cell.
///
/// Column extractors return these; the row projector logs them and renders the cell empty.
/// They never reach the hosting screen.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("malformed observation: {0}")]
    MalformedObservation(String),
    #[error("unsupported value for concept {concept}")]
    UnsupportedValue { concept: String },
    #[error("{0}")]
    Extraction(String),
}

pub type CellResult<T> = std::result::Result<T, CellError>;
