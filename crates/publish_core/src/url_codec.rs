//! Canonical storage URLs for published page snapshots.
//!
//! Every published artifact lives under
//! `<storage_root>/buildaweb-sites/tenants/<tenant>/projects/<project>/publishes/<publish>`.
//! The static site storage layer honors the same convention, so the layout
//! here must not drift.
use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Literal path segment that anchors every published site.
pub const SITES_SEGMENT: &str = "buildaweb-sites";
const TENANTS_SEGMENT: &str = "tenants";
const PROJECTS_SEGMENT: &str = "projects";
const PUBLISHES_SEGMENT: &str = "publishes";
const INDEX_FILE: &str = "index.html";
const HOME_SLUG: &str = "home";

/// Everything except the unreserved marks is escaped, so `/`, `?`, `#` and `%`
/// never leave their segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("slug {0:?} has no usable path segments")]
    EmptySlug(String),
    #[error("{field} must not be empty")]
    EmptyComponent { field: &'static str },
    #[error("{field} must not be a dot segment")]
    DotSegment { field: &'static str },
    #[error("storage root {0:?} is not an absolute http(s) url")]
    InvalidStorageRoot(String),
    #[error("storage root {0:?} contains the reserved `buildaweb-sites` segment")]
    ReservedSegment(String),
}

/// Identifies the storage subtree of exactly one publish snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublishLocator {
    storage_root: String,
    tenant_id: String,
    project_id: String,
    publish_id: String,
}

impl PublishLocator {
    /// Builds a locator, canonicalizing `storage_root` to `origin[/path]` with
    /// no empty or trailing segments.
    pub fn new(
        storage_root: &str,
        tenant_id: impl Into<String>,
        project_id: impl Into<String>,
        publish_id: impl Into<String>,
    ) -> Result<Self, CodecError> {
        let storage_root = canonical_storage_root(storage_root)?;
        let tenant_id = checked_identifier("tenant_id", tenant_id.into())?;
        let project_id = checked_identifier("project_id", project_id.into())?;
        let publish_id = checked_identifier("publish_id", publish_id.into())?;
        Ok(Self {
            storage_root,
            tenant_id,
            project_id,
            publish_id,
        })
    }

    pub fn storage_root(&self) -> &str {
        &self.storage_root
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn publish_id(&self) -> &str {
        &self.publish_id
    }

    /// Reference to one page's artifact inside this snapshot.
    pub fn page(&self, slug: impl Into<String>, is_home: bool) -> PublishPageRef {
        PublishPageRef {
            locator: self.clone(),
            slug: slug.into(),
            is_home,
        }
    }
}

/// One page's rendered artifact within a publish snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPageRef {
    pub locator: PublishLocator,
    pub slug: String,
    pub is_home: bool,
}

pub fn build_base_url(locator: &PublishLocator) -> String {
    format!(
        "{root}/{SITES_SEGMENT}/{TENANTS_SEGMENT}/{tenant}/{PROJECTS_SEGMENT}/{project}/{PUBLISHES_SEGMENT}/{publish}",
        root = locator.storage_root.trim_end_matches('/'),
        tenant = encode_segment(&locator.tenant_id),
        project = encode_segment(&locator.project_id),
        publish = encode_segment(&locator.publish_id),
    )
}

pub fn build_index_url(locator: &PublishLocator) -> String {
    format!("{}/{INDEX_FILE}", build_base_url(locator))
}

/// Home pages (flagged, or slugs `""`, `"/"`, `"home"` in any case) resolve to
/// the snapshot's root `index.html`; every other slug gets its own directory.
pub fn build_page_url(page: &PublishPageRef) -> Result<String, CodecError> {
    let trimmed = page.slug.trim_matches('/');
    if page.is_home || is_home_slug(trimmed) {
        return Ok(build_index_url(&page.locator));
    }

    let segments: Vec<Cow<'_, str>> = trimmed
        .split('/')
        .filter(|segment| !is_blank_segment(segment))
        .map(|segment| Cow::from(utf8_percent_encode(segment, SEGMENT)))
        .collect();
    if segments.is_empty() {
        return Err(CodecError::EmptySlug(page.slug.clone()));
    }

    Ok(format!(
        "{}/{}/{INDEX_FILE}",
        build_base_url(&page.locator),
        segments.join("/")
    ))
}

/// Recovers the locator from any url inside a publish subtree.
///
/// Returns `None` when the url does not follow the layout; a partially
/// filled locator is never produced.
pub fn parse_base_url(url: &str) -> Option<PublishLocator> {
    let parsed = Url::parse(url.trim()).ok()?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return None;
    }

    let segments: Vec<&str> = parsed.path_segments()?.collect();
    let marker = segments.iter().position(|segment| *segment == SITES_SEGMENT)?;
    let (tenant, project, publish) = match segments.get(marker + 1..marker + 7)? {
        [TENANTS_SEGMENT, tenant, PROJECTS_SEGMENT, project, PUBLISHES_SEGMENT, publish] => {
            (*tenant, *project, *publish)
        }
        _ => return None,
    };

    let mut storage_root = origin.ascii_serialization();
    for segment in segments[..marker].iter().filter(|s| !s.is_empty()) {
        storage_root.push('/');
        storage_root.push_str(segment);
    }

    PublishLocator::new(
        &storage_root,
        decode_segment(tenant)?,
        decode_segment(project)?,
        decode_segment(publish)?,
    )
    .ok()
}

fn is_home_slug(trimmed: &str) -> bool {
    let lowered = trimmed.to_lowercase();
    lowered.is_empty() || lowered == "/" || lowered == HOME_SLUG
}

// Dot segments would be collapsed by url resolution, so they are dropped like
// empty ones.
fn is_blank_segment(segment: &str) -> bool {
    segment.trim().is_empty() || segment == "." || segment == ".."
}

fn encode_segment(value: &str) -> Cow<'_, str> {
    utf8_percent_encode(value, SEGMENT).into()
}

fn decode_segment(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
}

fn checked_identifier(field: &'static str, value: String) -> Result<String, CodecError> {
    if value.is_empty() {
        return Err(CodecError::EmptyComponent { field });
    }
    if value == "." || value == ".." {
        return Err(CodecError::DotSegment { field });
    }
    Ok(value)
}

fn canonical_storage_root(raw: &str) -> Result<String, CodecError> {
    let invalid = || CodecError::InvalidStorageRoot(raw.to_string());
    if raw.trim().is_empty() {
        return Err(CodecError::EmptyComponent {
            field: "storage_root",
        });
    }
    let parsed = Url::parse(raw.trim()).map_err(|_| invalid())?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(invalid());
    }

    let mut root = origin.ascii_serialization();
    for segment in parsed.path_segments().into_iter().flatten() {
        if segment.is_empty() {
            continue;
        }
        if segment == SITES_SEGMENT {
            return Err(CodecError::ReservedSegment(raw.to_string()));
        }
        root.push('/');
        root.push_str(segment);
    }
    Ok(root)
}
