pub mod codec;
pub mod commands;
pub mod iu;
pub mod status;
