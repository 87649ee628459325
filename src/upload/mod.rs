//! Chunked Upload Module
//!
//! Reassembles files uploaded as independently transmitted chunks:
//! - Chunks are stored per identity, one file per sequence position
//! - Completion streams chunks in numeric order into the artifact while
//!   computing its SHA-256 in the same pass
//! - A JSON sidecar records display name, content type and digest
//! - Completions are serialized per identity
//!
//! Protocol Flow:
//! 1. Client derives the identity from the filename (base64url, no padding)
//! 2. Client uploads chunks `0..N` in any order
//! 3. Client asks the server to complete the identity
//! 4. Client downloads the artifact or inspects its metadata

pub mod assembler;
pub mod chunk_store;
pub mod content_type;
pub mod identity;
pub mod layout;
pub mod locks;
pub mod metadata;
pub mod retrieval;
pub mod types;

pub use assembler::{Assembler, CompletedUpload};
pub use chunk_store::{parse_chunk_index, ChunkStore};
pub use identity::{decode, encode, Identity};
pub use layout::StorageLayout;
pub use locks::CompletionLocks;
pub use metadata::{MetadataRecord, MetadataStore};
pub use retrieval::{ResolvedArtifact, Retrieval};
pub use types::*;
