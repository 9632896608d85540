use thiserror::Error;

/// Fatal problems found while normalizing a raw taxonomy document.
///
/// Any of these aborts the load before a layout is attempted.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum MalformedHierarchyError {
    #[error("node at {location} has no name")]
    MissingName { location: String },

    #[error("code `{name}` appears more than once in the hierarchy")]
    DuplicateName { name: String },

    #[error("code `{name}` reappears below itself; the hierarchy contains a cycle")]
    Cycle { name: String },

    #[error("leaf `{name}` has no value and no default leaf value is configured")]
    MissingValue { name: String },

    #[error("leaf `{name}` has invalid value {value}; values must be finite and non-negative")]
    InvalidValue { name: String, value: f64 },
}
