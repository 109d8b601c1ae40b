pub mod consts;
pub mod directories;
