pub mod candidate;
pub mod checklist;
pub mod compile;
pub mod config;
pub mod confirm;
pub mod error;
pub mod evidence;
pub mod io;
pub mod packet;
pub mod paths;
pub mod redact;
pub mod section;
pub mod validator;

pub use error::{Result, RippError};
