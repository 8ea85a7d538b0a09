pub mod domain;
pub mod ports;

pub use domain::{
    AggregatedContext, ChatTurn, Document, DocumentStatus, ExtractionEntry, ExtractionOutcome,
    Fingerprint, TurnRole,
};
pub use ports::{
    BlobStore, DocumentStore, GenerationRequest, GenerationService, PortError, PortResult,
    TextExtractor,
};
