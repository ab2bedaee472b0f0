pub mod edit_image;
pub mod generate;
pub mod init;
pub mod show;
pub mod take;
pub mod validate;
