//! Scout: LLM agents that run JSON-described tools, a supervisor that chains
//! them, and the workflows (ETL, report, RCA, PDF plans) built on top.

pub mod agents;
pub mod ai;
pub mod bootstrap;
pub mod config;
pub mod controllers;
pub mod docplan;
pub mod error;
pub mod etl;
pub mod http;
pub mod rca;
pub mod supervisor;
pub mod tools;

pub use error::{Error, Result};
