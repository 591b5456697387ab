#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

extern crate alloc;
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod context;
mod error;
mod serializer;

pub mod construction;
pub mod event;
pub mod exclusion;
pub mod handler;
pub mod metadata;
pub mod naming;
pub mod navigator;
pub mod types;
pub mod value;
pub mod visitor;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use context::{Context, Direction, Frame, PathSegment};
pub use error::{Error, ErrorKind, Result};
pub use serializer::{Serializer, SerializerBuilder};

#[cfg(feature = "auto_register")]
pub use inventory;
