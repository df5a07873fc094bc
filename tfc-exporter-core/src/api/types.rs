use chrono::{DateTime, Utc};

/// Relationship expansion requested when listing workspaces.
pub const CURRENT_RUN_INCLUDE: &str = "current_run";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Organization {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub email: String,
    pub external_id: String,
    pub owners_team_saml_role_id: String,
    pub saml_enabled: bool,
    pub two_factor_conformant: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub organization: String,
    pub terraform_version: String,
    pub created_at: Option<DateTime<Utc>>,
    pub environment: String,
    /// `None` when the workspace has never run.
    pub current_run: Option<Run>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Pagination metadata of a listing response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self { items, pagination }
    }
}

/// Query parameters of a paginated listing. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub page_number: u32,
    pub page_size: u32,
    pub include: Option<&'static str>,
}

impl ListOptions {
    pub fn page(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
            include: None,
        }
    }

    pub fn with_include(mut self, include: &'static str) -> Self {
        self.include = Some(include);
        self
    }
}
