pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod imaging;
pub mod provider;
pub mod review;
pub mod scanner;
pub mod session;
