pub mod coach;
pub mod config;
pub mod db;
pub mod llm;
pub mod parser;
pub mod stats;
