pub mod check;
pub mod drop;
pub mod init;

pub use check::{check, CheckArgs};
pub use drop::{drop_files, DropArgs};
pub use init::{init, InitArgs};
