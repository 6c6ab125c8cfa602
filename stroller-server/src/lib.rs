//! Stroller-friendly transit route planner server.
//!
//! A web application that answers: "how do I get from here to there on
//! public transit with a stroller?"

pub mod cache;
pub mod capabilities;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod orchestrator;
pub mod web;
