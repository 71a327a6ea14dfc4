//! Kaze language syntax definitions and abstract syntax tree.
//!
//! This crate provides the foundational syntax elements for the Kaze
//! programming language: token definitions, AST nodes, and the shared error
//! type. All other crates in the Kaze workspace depend on these types.
//!
//! The pipeline layers on top of each other:
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │              Parser                 │  <- Produces AST
//! ├─────────────────────────────────────┤
//! │               Lexer                 │  <- Produces Tokens
//! ├─────────────────────────────────────┤
//! │           Source Code               │  <- Raw text input
//! └─────────────────────────────────────┘
//! ```

/// Token types and lexical elements.
pub mod token;

/// Abstract syntax tree node definitions.
pub mod ast;

/// Error type and result alias shared across the toolchain.
pub mod error;

pub use ast::*;
pub use error::*;
pub use token::*;
