pub mod element;
pub mod link;
pub mod matrix;
pub mod request_gate;

mod error;

pub use element::{Color, ElementId, SourceElement, TargetElement};
pub use error::{Error, Result};
pub use link::{FeedbackLink, Link, LinksResponse, UpdateModelRequest, UpdateModelResponse};
pub use matrix::{Qualification, QualificationCell, QualificationMatrix, RawQualifications};
pub use request_gate::SuggestLinksRequest;

/// Smallest number of sources a request may carry.
pub const MIN_SOURCES: usize = 1;
/// Smallest number of targets a request may carry.
pub const MIN_TARGETS: usize = 2;
