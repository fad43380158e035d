pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{CodecConfig, DocLayout, NameOrder, SegmentFlags};
pub use crate::core::decoder::{decode, DecodeOutcome};
pub use crate::core::encoder::{encode, EncodeOutcome};
pub use crate::core::tokenizer::Delimiters;
pub use crate::core::validator::{Violation, ViolationKind};
pub use crate::domain::model::{Manifest, Reservation};
pub use crate::utils::error::{CodecError, Result};
