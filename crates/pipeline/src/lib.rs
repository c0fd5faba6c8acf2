//! Built-in genapi pipelines: Swagger 2.0 / OpenAPI 3.x descriptions to
//! TypeScript request functions (axios or fetch) and type declarations.
//!
//! Each stage is a plain function; [`builtin`] plugs them into the core's
//! stage catalogue and publishes the `swag-axios-ts` and `swag-fetch-ts`
//! pipelines.

pub mod builtin;
pub mod dest;
pub mod emit;
pub mod openapi;
pub mod original;
pub mod parser;
pub mod read_config;
pub mod synthesize;
pub mod utils;

pub use builtin::{builtin_registry, register_builtin, render, resolver};
pub use emit::Emit;
pub use parser::HttpClient;
pub use synthesize::{RequestSynthesizer, TypingsSynthesizer, dispatcher};
