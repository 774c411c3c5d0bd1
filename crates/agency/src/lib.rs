//! Composable LLM operations, ready to use with OpenAI-compatible APIs.
//!
//! The crate bundles the operation layer with its providers. With the
//! `cli` feature (on by default) it also ships a handful of demo programs
//! under `src/bin`.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

#[cfg(feature = "cli")]
pub mod cli;

/// Re-exports of [`agency_core`] crate.
pub mod core {
    pub use agency_core::*;
}

/// Re-exports of [`agency_model`] crate.
pub mod model {
    pub use agency_model::*;
}

/// Re-exports of [`agency_openai`] crate.
pub mod openai {
    pub use agency_openai::*;
}

/// Re-exports of [`agency_weaviate`] crate.
pub mod weaviate {
    pub use agency_weaviate::*;
}

pub use agency_core::{
    FuncDef, Message, Operation, Process, PromptTemplate, Provider,
};
