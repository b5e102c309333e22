//! Blocking API client core for the secondhand-clothing marketplace.
//!
//! # Overview
//! Builds `HttpRequest` values for every backend operation, executes them
//! through a pluggable [`Transport`], and normalizes responses into typed
//! records or a tagged [`ApiError`].
//!
//! # Design
//! - `MarketplaceClient` is stateless; it holds only the resolved
//!   [`ClientConfig`].
//! - Request building and response decoding are pure, so both are tested
//!   without a server. Only `Transport::execute` does I/O.
//! - Server-side filtering is the source of truth; [`LocalFilter`] narrows
//!   results only on fields the backend does not filter.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod sequence;
pub mod source;
pub mod transport;
pub mod types;

pub use client::{MarketplaceClient, Storefront, SELLER_ID_HEADER};
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use filter::{Choice, LocalFilter, ProductFilters};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use sequence::{RequestSequence, RequestToken, Tracked};
pub use source::ProductSource;
pub use transport::{RequestOptions, Transport, UreqTransport};
pub use types::{
    Category, HealthStatus, Id, Message, NewCategory, NewMessage, NewOrder, NewUser, Order,
    OrderSummary, Product, ProductDraft, Section, User,
};
