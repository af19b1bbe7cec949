pub mod error;
pub mod prompt;
pub mod rag_service;
