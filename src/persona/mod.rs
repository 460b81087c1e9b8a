//! Persona collaborator - the maestri under test.
//!
//! The harness never mutates personas; it looks them up by id or lists them
//! all through [`PersonaLookup`].

pub mod registry;
pub mod types;

pub use registry::PersonaRegistry;
pub use types::{Persona, PersonaFile, PersonaLookup};
