pub mod blob;
pub mod llm;
pub mod pdf;
pub mod store;

pub use blob::HttpBlobStore;
pub use llm::OpenAiChatAdapter;
pub use pdf::PdfTextExtractor;
pub use store::PgDocumentStore;
