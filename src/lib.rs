//! Fault-tolerant gateway in front of a content API and a generative-text
//! API, with a distributed cache that degrades to process memory and a
//! document export pipeline (PDF, DOCX, RTF).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod render;
pub mod resilience;
