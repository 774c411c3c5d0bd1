//! A provider-neutral protocol for talking to LLM services.
//!
//! Operations built on top of this crate never see the wire format of a
//! particular vendor. They build a [`ModelRequest`], hand it to a
//! [`ModelProvider`], and pull [`ModelResponseEvent`]s out of the
//! response until it completes. Speech synthesis goes through the
//! separate [`SpeechProvider`] trait since it returns raw audio instead
//! of events.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;
mod speech;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
pub use speech::*;
