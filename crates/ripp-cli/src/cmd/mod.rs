pub mod build;
pub mod checklist;
pub mod discover;
pub mod evidence;
pub mod init;
pub mod validate;
