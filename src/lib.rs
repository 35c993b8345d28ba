pub mod composer;
pub mod config;
pub mod document;
pub mod error;
pub mod http;
pub mod model;
pub mod outline;
pub mod pipeline;
pub mod record;
pub mod validation;

pub use composer::{Composer, TemplateComposer};
pub use document::Assembler;
pub use error::{DiplomError, Result};
pub use outline::Profile;
pub use pipeline::{Pacing, Pipeline};

