// ── Site domain type ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── SiteId ──────────────────────────────────────────────────────────

/// Opaque identifier of a tenant site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SiteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SiteId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── Lifecycle / subscription enums ──────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SiteStatus {
    #[default]
    Uploaded,
    Analyzed,
    Deployed,
    Failed,
}

/// Subscription tier. Unknown or missing values read as [`Plan::Basic`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case", from = "Option<String>")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Plan {
    #[default]
    Basic,
    Standard,
    Pro,
}

impl From<Option<String>> for Plan {
    fn from(s: Option<String>) -> Self {
        s.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
    }
}

/// Payment-provider-derived account state. Unknown or missing values read
/// as [`BillingStatus::Inactive`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case", from = "Option<String>")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BillingStatus {
    #[default]
    Inactive,
    Active,
    PastDue,
    Canceled,
}

impl From<Option<String>> for BillingStatus {
    fn from(s: Option<String>) -> Self {
        s.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
    }
}

// ── Meta ────────────────────────────────────────────────────────────

/// Analysis metadata cached on the site record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteMeta {
    pub pages: u32,
    pub scripts: u32,
    pub seo_score: u8,
    pub title: String,
    pub description: String,
    /// Favicon as a `data:` URI, when one was resolved.
    pub favicon: Option<String>,
}

/// Partial update of [`SiteMeta`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteMetaPatch {
    pub pages: Option<u32>,
    pub scripts: Option<u32>,
    pub seo_score: Option<u8>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub favicon: Option<String>,
}

impl SiteMetaPatch {
    pub fn apply(self, meta: &mut SiteMeta) {
        if let Some(pages) = self.pages {
            meta.pages = pages;
        }
        if let Some(scripts) = self.scripts {
            meta.scripts = scripts;
        }
        if let Some(score) = self.seo_score {
            meta.seo_score = score;
        }
        if let Some(title) = self.title {
            meta.title = title;
        }
        if let Some(description) = self.description {
            meta.description = description;
        }
        if let Some(favicon) = self.favicon {
            meta.favicon = Some(favicon);
        }
    }
}

// ── Site ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    /// Owning tenant (account) identifier.
    pub tenant_id: String,
    /// Where weekly reports go. Reports are skipped when absent.
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub status: SiteStatus,
    /// Public URL of the live deployment. Present iff `status` is `deployed`.
    #[serde(default)]
    pub deploy_url: Option<String>,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub billing_status: BillingStatus,
    #[serde(default)]
    pub meta: SiteMeta,
}

impl Site {
    /// The deployment URL, if set and non-empty.
    pub fn deploy_url(&self) -> Option<&str> {
        self.deploy_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Whether the site has a live deployment that maintenance can reach.
    pub fn is_maintainable(&self) -> bool {
        self.status == SiteStatus::Deployed && self.deploy_url().is_some()
    }

    /// Check the deployment invariant: a non-empty deployment URL exists
    /// if and only if the site is deployed.
    pub fn validate(&self) -> Result<(), &'static str> {
        match (self.status, self.deploy_url()) {
            (SiteStatus::Deployed, None) => Err("deployed site has no deployment URL"),
            (SiteStatus::Deployed, Some(_)) | (_, None) => Ok(()),
            (_, Some(_)) => Err("undeployed site carries a deployment URL"),
        }
    }
}
