//! Product filtering: server-side query parameters and local predicates.
//!
//! The server is the source of truth for every field in [`ProductFilters`].
//! [`LocalFilter`] only covers checks the backend is not guaranteed to
//! support, and is applied on top of whatever the server returned.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::types::{Product, Section};

/// Query parameters for `GET /products`. Absent fields are omitted from the
/// query string entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFilters {
    pub search: Option<String>,
    pub section: Option<Section>,
    pub category_id: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub style: Option<String>,
    pub gender: Option<String>,
    pub condition: Option<String>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn section(mut self, section: Section) -> Self {
        self.section = Some(section);
        self
    }

    pub fn category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn page(mut self, skip: u32, limit: u32) -> Self {
        self.skip = Some(skip);
        self.limit = Some(limit);
        self
    }

    /// Present parameters in wire order. Empty strings count as absent;
    /// numbers are sent whenever set, including an explicit zero.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push_text(&mut params, "search", &self.search);
        if let Some(section) = self.section {
            params.push(("section", section.to_string()));
        }
        if let Some(category_id) = self.category_id {
            params.push(("category_id", category_id.to_string()));
        }
        push_text(&mut params, "size", &self.size);
        push_text(&mut params, "color", &self.color);
        push_text(&mut params, "style", &self.style);
        push_text(&mut params, "gender", &self.gender);
        push_text(&mut params, "condition", &self.condition);
        if let Some(skip) = self.skip {
            params.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }

    /// Form-urlencoded query string without the leading `?`, or `None` when
    /// no parameter is present.
    pub fn to_query(&self) -> Option<String> {
        let params = self.params();
        if params.is_empty() {
            return None;
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &params {
            serializer.append_pair(name, value);
        }
        Some(serializer.finish())
    }
}

fn push_text(params: &mut Vec<(&'static str, String)>, name: &'static str, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        params.push((name, value.to_string()));
    }
}

/// One local check: either disabled (`All`) or an exact value to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    /// Labels the UI uses for "no restriction".
    pub const ALL_LABELS: [&'static str; 2] = ["Все", "All"];

    /// Parse a picker label; the match-all labels and blank input disable
    /// the check.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || Self::ALL_LABELS.iter().any(|all| label.eq_ignore_ascii_case(all)) {
            Choice::All
        } else {
            Choice::Only(label.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(expected) => value == Some(expected.as_str()),
        }
    }
}

/// Conjunction of per-field checks applied to an already fetched list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFilter {
    pub style: Choice,
    pub color: Choice,
    pub size: Choice,
    pub gender: Choice,
    pub condition: Choice,
    /// Case-insensitive substring of the title, e.g. a clothing category
    /// name the backend has no column for.
    pub title_contains: Choice,
}

impl LocalFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any check is enabled.
    pub fn is_active(&self) -> bool {
        [
            &self.style,
            &self.color,
            &self.size,
            &self.gender,
            &self.condition,
            &self.title_contains,
        ]
        .iter()
        .any(|choice| !choice.is_all())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.style.matches(product.style.as_deref())
            && self.color.matches(product.color.as_deref())
            && self.size.matches(product.size.as_deref())
            && self.gender.matches(product.gender.as_deref())
            && self.condition.matches(product.condition.as_deref())
            && self.title_matches(&product.title)
    }

    fn title_matches(&self, title: &str) -> bool {
        match &self.title_contains {
            Choice::All => true,
            Choice::Only(needle) => title.to_lowercase().contains(&needle.to_lowercase()),
        }
    }

    /// Keep matching products in their original order.
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        if !self.is_active() {
            return products;
        }
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}
