//! SubjectAI Billing - Stripe subscriptions for SubjectAI
//!
//! This crate maps Stripe checkout sessions, subscriptions and webhook
//! deliveries onto SubjectAI's subscriber records, and serves the billing
//! endpoints the web client calls.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
