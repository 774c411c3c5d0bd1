//! Composable operations over large language models: prompt templates,
//! function calling, streaming, image description and speech synthesis.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod config;
mod error;
mod message;
mod model_client;
mod operation;
mod ops;
mod process;
mod provider;
mod template;
mod tool;

pub use config::{OperationConfig, OperationOption};
pub use error::{BoxError, Error, ErrorKind};
pub use message::{Kind, Message, Role};
pub use operation::Operation;
pub use ops::{
    ImageToTextParams, TextToSpeechParams, TextToStreamParams,
    TextToTextParams, sniff_image_mime,
};
pub use process::Process;
pub use provider::Provider;
pub use template::PromptTemplate;
pub use tool::FuncDef;
