use glossary_core::{NewTerm, Term, TermUpdate};
use utoipa::OpenApi;

use crate::problem::ProblemDetails;

pub const OPENAPI_PATH: &str = "/openapi.json";
pub const DOCS_PATH: &str = "/docs";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Glossary API",
        version = "1.0.0",
        description = "A simple glossary API."
    ),
    paths(
        crate::terms::list,
        crate::terms::fetch,
        crate::terms::create,
        crate::terms::update,
        crate::terms::delete,
    ),
    components(schemas(Term, NewTerm, TermUpdate, ProblemDetails)),
    tags((name = "terms", description = "Glossary term management"))
)]
pub struct ApiDoc;
