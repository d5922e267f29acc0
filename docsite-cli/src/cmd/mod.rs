pub mod export;
pub mod nav;
pub mod show;
pub mod themes;
