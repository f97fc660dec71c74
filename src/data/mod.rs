//! Data layer: tables, loading, and cycle filtering.
//!
//! Architecture:
//! ```text
//!  .txt / .mpt / .parquet
//!        │
//!        ▼
//!   ┌────────────────┐
//!   │ LoaderRegistry  │  (format, data type) → transform → Table
//!   └────────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Table    │  named numeric columns, source row order
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  cycle filter → view table
//!   └──────────┘
//! ```

pub mod browse;
pub mod eclab;
pub mod filter;
pub mod loader;
pub mod model;
