//! The product catalogue as seen by a storefront UI.

use crate::client::Storefront;
use crate::error::Result;
use crate::filter::ProductFilters;
use crate::transport::Transport;
use crate::types::{Id, Product};

/// Anything that can list and look up products.
///
/// The REST-backed [`Storefront`] is the production implementation; UI code
/// depends on this trait so it can be driven by a fixed catalogue in tests.
pub trait ProductSource {
    fn products(&self, filters: &ProductFilters) -> Result<Vec<Product>>;

    fn product(&self, id: &Id) -> Result<Product>;
}

impl<T: Transport> ProductSource for Storefront<T> {
    fn products(&self, filters: &ProductFilters) -> Result<Vec<Product>> {
        self.list_products(filters)
    }

    fn product(&self, id: &Id) -> Result<Product> {
        self.get_product(id)
    }
}
