//! Pipeline stages for PDF-to-quiz extraction.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the service client can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ llm ──▶ parse
//! (select)  (base64)  (Gemini) (validate)
//! ```
//!
//! 1. [`input`] : the user's ordered, PDF-only file selection
//! 2. [`encode`]: read each file and wrap it as an inline base64 part
//! 3. [`llm`]   : build the one request per batch and call the service;
//!    the only stage with network I/O
//! 4. [`parse`] : validate the reply against the declared structure and
//!    assign question ids

pub mod encode;
pub mod input;
pub mod llm;
pub mod parse;
