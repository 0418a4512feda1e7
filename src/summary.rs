//! Reply construction for resolved and unresolved queries

use tracing::debug;

use crate::catalog::{PackageRecord, OWNER_SEPARATOR};
use crate::matching::normalize;
use crate::resolver::Resolver;

/// Dependencies listed before the list is cut with `...`
pub const MAX_LISTED_DEPENDENCIES: usize = 3;

/// Fuzzy hits at or below this distance are answered as if spelled exactly
pub const REDIRECT_DISTANCE: usize = 2;

pub const DEPRECATION_NOTICE: &str =
    "This mod is deprecated. Alternative packages should be used whenever possible.";

pub const DEFAULT_EMBED_COLOR: u32 = 0x7E0923;

/// Rendering knobs taken from the bot configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySettings {
    /// Dependencies whose id contains any of these are left out of summaries
    pub hidden_dependencies: Vec<String>,
    pub embed_color: u32,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            hidden_dependencies: vec!["BepInEx-BepInExPack".to_string()],
            embed_color: DEFAULT_EMBED_COLOR,
        }
    }
}

/// Everything a package reply shows
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub title: String,
    pub description: String,
    pub deprecated: bool,
    pub version: String,
    pub links: Links,
    /// At most [`MAX_LISTED_DEPENDENCIES`] entries
    pub dependencies: Vec<DependencyRef>,
    /// More dependencies existed than are listed
    pub dependencies_truncated: bool,
    pub author: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Links {
    pub page: String,
    pub download: String,
    pub site: Option<SiteLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteLink {
    pub label: &'static str,
    pub url: String,
}

impl SiteLink {
    /// Labelled `Github` for github.com hosts, `Website` otherwise
    pub fn from_url(url: &str) -> Self {
        let on_github = reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.contains("github.com")))
            .unwrap_or(false);

        Self {
            label: if on_github { "Github" } else { "Website" },
            url: url.to_string(),
        }
    }
}

/// A dependency shown as `owner - name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    pub owner: Option<String>,
    pub name: String,
}

impl DependencyRef {
    /// Parse `Owner-Name-1.0.0`; the trailing version is dropped
    ///
    /// Owner and name are only paired when a version follows them; shorter
    /// ids show their last segment alone. Underscores read as spaces.
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim().replace('_', " ");
        let parts: Vec<&str> = id.split(OWNER_SEPARATOR).collect();

        let (owner, name) = match parts.as_slice() {
            [] | [""] => return None,
            [name] | [_, name] => (None, *name),
            [.., owner, name, _version] => (Some(*owner), *name),
        };

        Some(Self {
            owner: owner.map(str::to_string),
            name: name.to_string(),
        })
    }

    pub fn render(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{owner} - {}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Reply for a query that resolved to nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub query: String,
    /// Display name of the closest package, if any was close enough
    pub suggestion: Option<String>,
}

impl NotFound {
    pub fn message(&self) -> String {
        match &self.suggestion {
            Some(suggestion) => format!(
                "Could not find a mod named {}. Did you mean {}?",
                self.query, suggestion
            ),
            None => format!("Could not find a mod named {}.", self.query),
        }
    }
}

/// Result of the not-found path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundOutcome {
    /// The query is a near-exact misspelling; answer for this title instead
    Redirect(String),
    NotFound(NotFound),
}

/// Platform-neutral rich message
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            inline,
        }
    }
}

/// Anything the bot sends back
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Summary(Box<Summary>),
    NotFound(NotFound),
    Text(String),
}

impl Reply {
    /// Rich form of the reply; plain text replies have none
    pub fn to_embed(&self, color: u32) -> Option<Embed> {
        match self {
            Reply::Summary(summary) => Some(summary.to_embed(color)),
            Reply::NotFound(not_found) => Some(not_found.to_embed(color)),
            Reply::Text(_) => None,
        }
    }
}

impl Summary {
    pub fn to_embed(&self, color: u32) -> Embed {
        let description = if self.deprecated {
            format!("~~{}~~\n\n{}", self.description, DEPRECATION_NOTICE)
        } else {
            self.description.clone()
        };

        let mut fields = vec![
            EmbedField::new("Version", self.version.as_str(), false),
            EmbedField::new("Links", self.links.render(), false),
        ];
        if let Some(dependencies) = self.render_dependencies() {
            fields.push(EmbedField::new("Dependencies", dependencies, true));
        }
        fields.push(EmbedField::new("Author", self.author.as_str(), false));

        Embed {
            title: self.title.clone(),
            description,
            color,
            fields,
            thumbnail: self.icon.clone(),
        }
    }

    /// Bulleted dependency list, `None` when there are no dependencies
    pub fn render_dependencies(&self) -> Option<String> {
        if self.dependencies.is_empty() {
            return None;
        }

        let mut lines: Vec<String> = self
            .dependencies
            .iter()
            .map(|d| format!("• {}", d.render()))
            .collect();
        if self.dependencies_truncated {
            lines.push("...".to_string());
        }
        Some(lines.join("\n"))
    }
}

impl Links {
    pub fn render(&self) -> String {
        let mut out = format!("[Page]({}) | [Download]({})", self.page, self.download);
        if let Some(site) = &self.site {
            out.push_str(&format!(" | [{}]({})", site.label, site.url));
        }
        out
    }
}

impl NotFound {
    pub fn to_embed(&self, color: u32) -> Embed {
        Embed {
            title: "Mod Not Found".to_string(),
            description: self.message(),
            color,
            fields: Vec::new(),
            thumbnail: None,
        }
    }
}

/// Builds replies from one snapshot
pub struct SummaryBuilder<'a> {
    resolver: Resolver<'a>,
    settings: &'a SummarySettings,
}

impl<'a> SummaryBuilder<'a> {
    pub fn new(records: &'a [PackageRecord], settings: &'a SummarySettings) -> Self {
        Self {
            resolver: Resolver::new(records),
            settings,
        }
    }

    pub fn resolver(&self) -> &Resolver<'a> {
        &self.resolver
    }

    /// Summary of the record's chosen version; `None` without versions
    pub fn build(&self, record: &PackageRecord) -> Option<Summary> {
        let version = record.chosen_version()?;
        let deprecated = record.is_deprecated();

        let description = version
            .description
            .as_deref()
            .unwrap_or(record.description())
            .to_string();

        let mut title = display_name(version.name());
        if deprecated {
            title.push_str(if title.ends_with(' ') { "- " } else { " - " });
            title.push_str("Deprecated");
        }

        let site = version
            .website_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(SiteLink::from_url);

        let mut shown = version
            .dependencies
            .iter()
            .filter(|id| !self.is_hidden_dependency(id))
            .filter_map(|id| DependencyRef::parse(id));
        let dependencies: Vec<DependencyRef> =
            shown.by_ref().take(MAX_LISTED_DEPENDENCIES).collect();
        let dependencies_truncated = shown.next().is_some();

        let author = match record.author() {
            "" => "Unknown".to_string(),
            author => display_name(author),
        };

        let icon = version
            .icon
            .as_deref()
            .or(record.icon.as_deref())
            .filter(|icon| !icon.is_empty())
            .map(str::to_string);

        Some(Summary {
            title,
            description,
            deprecated,
            version: version
                .version_number
                .as_deref()
                .unwrap_or(version.name())
                .to_string(),
            links: Links {
                page: record.package_url.clone().unwrap_or_default(),
                download: version.download_link().to_string(),
                site,
            },
            dependencies,
            dependencies_truncated,
            author,
            icon,
        })
    }

    /// Summary for the record [`Resolver::find_by_title`] picks for `title`
    pub fn build_for_title(&self, title: &str) -> Option<Summary> {
        self.resolver
            .find_by_title(&normalize(title))
            .and_then(|record| self.build(record))
    }

    /// Suggest or redirect for a query that did not resolve
    pub fn not_found(&self, query: &str) -> NotFoundOutcome {
        let closest = self.resolver.closest_title(query);
        if closest.is_hit() && closest.distance <= REDIRECT_DISTANCE {
            debug!(query, title = %closest.title, distance = closest.distance, "Redirecting near miss");
            return NotFoundOutcome::Redirect(closest.title);
        }

        NotFoundOutcome::NotFound(NotFound {
            query: query.to_string(),
            suggestion: closest.is_hit().then(|| display_name(&closest.title)),
        })
    }

    /// Full lookup: exact resolution, then redirect or suggestion
    ///
    /// A redirect is followed once; if its target has no summary either,
    /// the reply is a not-found message suggesting that target.
    pub fn respond(&self, query: &str) -> Reply {
        if self.resolver.exists(query) {
            if let Some(summary) = self.build_for_title(query) {
                return Reply::Summary(Box::new(summary));
            }
        }

        match self.not_found(query) {
            NotFoundOutcome::Redirect(title) => match self.build_for_title(&title) {
                Some(summary) => Reply::Summary(Box::new(summary)),
                None => Reply::NotFound(NotFound {
                    query: query.to_string(),
                    suggestion: Some(display_name(&title)),
                }),
            },
            NotFoundOutcome::NotFound(not_found) => Reply::NotFound(not_found),
        }
    }

    fn is_hidden_dependency(&self, id: &str) -> bool {
        self.settings
            .hidden_dependencies
            .iter()
            .any(|hidden| id.contains(hidden.as_str()))
    }
}

/// Registry names use underscores for spaces
fn display_name(name: &str) -> String {
    name.replace('_', " ")
}
