//! Minimal JSON:API document model for the handful of endpoints we read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use super::{
    ApiError,
    types::{Organization, Page, Pagination, Run, Workspace},
};

#[derive(Debug, Deserialize)]
pub(crate) struct Document<D> {
    pub data: D,
    #[serde(default)]
    pub included: Vec<Resource>,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Meta {
    #[serde(default)]
    pub pagination: Option<PaginationMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct PaginationMeta {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub relationships: HashMap<String, Relationship>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Relationship {
    #[serde(default)]
    pub data: Option<Value>,
}

impl Relationship {
    /// To-one linkage. Array linkages and `null` yield `None`.
    fn single(&self) -> Option<Resource> {
        self.data
            .as_ref()
            .filter(|data| data.is_object())
            .and_then(|data| serde_json::from_value(data.clone()).ok())
    }
}

impl Resource {
    fn attributes<A>(&self) -> Result<A, ApiError>
    where
        A: DeserializeOwned + Default,
    {
        if self.attributes.is_null() {
            return Ok(A::default());
        }
        serde_json::from_value(self.attributes.clone()).map_err(|err| {
            ApiError::Parse(format!(
                "{} {} attributes: {err}",
                self.kind, self.id
            ))
        })
    }

    fn related(&self, name: &str) -> Option<Resource> {
        self.relationships.get(name).and_then(Relationship::single)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct OrganizationAttributes {
    name: Option<String>,
    created_at: Option<DateTime<Utc>>,
    email: Option<String>,
    external_id: Option<String>,
    owners_team_saml_role_id: Option<String>,
    saml_enabled: Option<bool>,
    two_factor_conformant: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct WorkspaceAttributes {
    name: Option<String>,
    created_at: Option<DateTime<Utc>>,
    environment: Option<String>,
    terraform_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RunAttributes {
    status: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

pub(crate) fn organization(
    resource: &Resource,
) -> Result<Organization, ApiError> {
    let attrs: OrganizationAttributes = resource.attributes()?;
    Ok(Organization {
        // Organization ids are their names.
        name: attrs.name.unwrap_or_else(|| resource.id.clone()),
        created_at: attrs.created_at,
        email: attrs.email.unwrap_or_default(),
        external_id: attrs.external_id.unwrap_or_default(),
        owners_team_saml_role_id: attrs
            .owners_team_saml_role_id
            .unwrap_or_default(),
        saml_enabled: attrs.saml_enabled.unwrap_or(false),
        two_factor_conformant: attrs.two_factor_conformant.unwrap_or(false),
    })
}

pub(crate) fn workspace(
    resource: &Resource,
    included: &[Resource],
) -> Result<Workspace, ApiError> {
    let attrs: WorkspaceAttributes = resource.attributes()?;
    let organization = resource
        .related("organization")
        .map(|org| org.id)
        .unwrap_or_default();
    let current_run = resource
        .related("current-run")
        .map(|linkage| current_run(linkage, included))
        .transpose()?;

    Ok(Workspace {
        id: resource.id.clone(),
        name: attrs.name.unwrap_or_default(),
        organization,
        terraform_version: attrs.terraform_version.unwrap_or_default(),
        created_at: attrs.created_at,
        environment: attrs.environment.unwrap_or_default(),
        current_run,
    })
}

/// Resolves run attributes from the linkage itself or, failing that, from
/// the compound document's `included` section.
fn current_run(
    linkage: Resource,
    included: &[Resource],
) -> Result<Run, ApiError> {
    let source = if linkage.attributes.is_null() {
        included
            .iter()
            .find(|res| res.kind == linkage.kind && res.id == linkage.id)
            .unwrap_or(&linkage)
    } else {
        &linkage
    };
    let attrs: RunAttributes = source.attributes()?;
    Ok(Run {
        id: linkage.id.clone(),
        status: attrs.status,
        created_at: attrs.created_at,
    })
}

pub(crate) fn workspace_page(
    document: Document<Vec<Resource>>,
) -> Result<Page<Workspace>, ApiError> {
    let items = document
        .data
        .iter()
        .map(|resource| workspace(resource, &document.included))
        .collect::<Result<Vec<_>, _>>()?;
    let pagination = document
        .meta
        .pagination
        .map(|meta| Pagination {
            current_page: meta.current_page,
            total_pages: meta.total_pages,
            total_count: meta.total_count,
        })
        .ok_or_else(|| {
            ApiError::Parse("workspace list is missing pagination".into())
        })?;
    Ok(Page::new(items, pagination))
}
