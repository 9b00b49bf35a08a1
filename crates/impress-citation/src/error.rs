use impress_entities::GraphError;

/// Errors that abort normalization of one citation.
///
/// Root and publication type are checked before the graph is touched.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Expected an element-citation root, found <{0}>")]
    UnexpectedRoot(String),

    #[error("Unknown publication type: {0}")]
    UnknownPublicationType(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Errors from reading JATS XML.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Document has no root element")]
    Empty,

    #[error("Element <{0}> is never closed")]
    Unclosed(String),

    #[error("Document has more than one root element")]
    MultipleRoots,

    #[error("No citation found under <{0}>")]
    NoCitation(String),
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        ParseError::Xml(err.to_string())
    }
}
