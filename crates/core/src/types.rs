use serde::Serialize;
use utoipa::ToSchema;

/// Glossary entry as persisted and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Term {
    /// Identifier assigned by the store on creation.
    #[schema(example = 1)]
    pub id: i64,
    /// Unique name, fixed once the term exists.
    #[schema(example = "latency")]
    pub name: String,
    #[schema(example = "time to respond")]
    pub description: String,
}

/// Payload accepted when creating a term.
#[derive(Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct NewTerm {
    #[schema(example = "latency")]
    pub name: String,
    #[schema(example = "time to respond")]
    pub description: String,
}

/// Payload accepted when replacing the description of an existing term.
#[derive(Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct TermUpdate {
    #[schema(example = "response delay")]
    pub description: String,
}
