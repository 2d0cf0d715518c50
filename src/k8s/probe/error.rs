// Error definitions for the health registry.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("check {name:?} is already registered in {registry}")]
    Duplicate { registry: String, name: String },

    #[error("check name must not be empty")]
    EmptyName,
}
