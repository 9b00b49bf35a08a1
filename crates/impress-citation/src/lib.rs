//! Citation normalization for impress-entities.
//!
//! Reads raw citation trees (JATS `element-citation` and friends) and turns
//! them into bibliographic entries with a fixed, complete property shape.

pub mod element;
pub mod error;
pub mod jats;
pub mod location;
pub mod normalizer;

pub use element::CitationElement;
pub use error::{NormalizeError, ParseError};
pub use jats::{parse_element_citation, parse_ref_list, parse_tree};
pub use location::{JatsLocationExtractor, LocationExtractor};
pub use normalizer::{
    import_references, normalize, ImportReport, NormalizeWarning, NormalizedCitation, Normalizer,
};
