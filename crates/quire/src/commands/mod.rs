//! Commands that act on a repository as a whole.

pub mod init;
