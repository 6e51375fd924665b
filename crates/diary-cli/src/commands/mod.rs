pub mod entries;
pub mod init;
pub mod legacy;
pub mod misc;
pub mod session;
