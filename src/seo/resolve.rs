//! Descriptor resolution: global defaults overlaid with a sidecar.

use super::{
    ResolvedSeoDescriptor, RobotsDirectives, SeoError, SidecarOverride, SidecarStore,
    SitemapSettings, error::check_unit_interval,
};
use crate::{
    config::SiteConfig,
    discovery::{RenderMode, RouteNode},
    log,
    utils::date::parse_lastmod,
};

/// Resolve one route.
///
/// Returns a validation error for out-of-range numbers or unparsable dates
/// in the sidecar; values are never clamped.
pub fn resolve(
    route: &RouteNode,
    sidecar: Option<&SidecarOverride>,
    config: &SiteConfig,
) -> Result<ResolvedSeoDescriptor, SeoError> {
    let mut desc = defaults(route, config);
    if let Some(sidecar) = sidecar {
        apply_sidecar(&mut desc, sidecar, config)?;
    }
    enforce_exclusion(&mut desc);
    Ok(desc)
}

/// Resolve every route, falling back to defaults for invalid sidecars.
pub fn resolve_all(
    routes: &[RouteNode],
    sidecars: &SidecarStore,
    config: &SiteConfig,
) -> Vec<ResolvedSeoDescriptor> {
    routes
        .iter()
        .map(|route| {
            resolve(route, sidecars.get(&route.route_path), config).unwrap_or_else(|err| {
                log!("seo"; "{}: {err}, using defaults", route.route_path);
                let mut desc = defaults(route, config);
                enforce_exclusion(&mut desc);
                desc
            })
        })
        .collect()
}

/// Descriptor derived from the route and global config alone.
fn defaults(route: &RouteNode, config: &SiteConfig) -> ResolvedSeoDescriptor {
    let admin_title = default_admin_title(&route.route_path);
    let (priority, change_frequency) = if route.is_home() {
        (config.sitemap.home_priority, config.sitemap.home_change_frequency)
    } else {
        (config.sitemap.page_priority, config.sitemap.page_change_frequency)
    };

    ResolvedSeoDescriptor {
        route_path: route.route_path.clone(),
        kind: route.kind,
        render_mode: route.render_mode,
        title: config.site.apply_title_template(&admin_title),
        description: config.site.description.clone(),
        keywords: config.site.keywords.clone(),
        canonical: config.site.absolute_url(&route.route_path),
        robots: RobotsDirectives::default(),
        sitemap: SitemapSettings {
            priority,
            change_frequency,
            excluded: false,
        },
        admin_title,
        category: None,
        featured: false,
        draft: false,
        last_modified: None,
    }
}

/// Overlay sidecar fields. `seo.*` is ignored on client-rendered routes.
fn apply_sidecar(
    desc: &mut ResolvedSeoDescriptor,
    sidecar: &SidecarOverride,
    config: &SiteConfig,
) -> Result<(), SeoError> {
    if let Some(title) = non_empty(&sidecar.title) {
        desc.admin_title = title.to_owned();
        desc.title = config.site.apply_title_template(title);
    }
    desc.category = non_empty(&sidecar.category).map(str::to_owned);
    desc.featured = sidecar.featured.unwrap_or(false);
    desc.draft = sidecar.draft.unwrap_or(false);
    desc.last_modified = match &sidecar.last_modified {
        Some(raw) => Some(parse_lastmod(raw).ok_or_else(|| SeoError::InvalidDate(raw.clone()))?),
        None => None,
    };

    let Some(seo) = sidecar.seo.as_ref() else {
        return Ok(());
    };
    if desc.render_mode == RenderMode::Client {
        return Ok(());
    }

    if let Some(title) = non_empty(&seo.title) {
        desc.title = title.to_owned();
    }
    if let Some(description) = non_empty(&seo.description) {
        desc.description = description.to_owned();
    }
    if let Some(keywords) = &seo.keywords {
        let keywords: std::collections::BTreeSet<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_owned)
            .collect();
        if !keywords.is_empty() {
            desc.keywords = keywords;
        }
    }
    if let Some(canonical) = non_empty(&seo.canonical) {
        desc.canonical = config.site.absolute_url(canonical);
    }
    if let Some(robots) = &seo.robots {
        desc.robots.index = robots.index.unwrap_or(desc.robots.index);
        desc.robots.follow = robots.follow.unwrap_or(desc.robots.follow);
    }
    if let Some(sitemap) = &seo.sitemap {
        if let Some(priority) = sitemap.priority {
            desc.sitemap.priority = check_unit_interval("seo.sitemap.priority", priority)?;
        }
        if let Some(freq) = sitemap.change_frequency {
            desc.sitemap.change_frequency = freq;
        }
        desc.sitemap.excluded = sitemap.excluded.unwrap_or(false);
    }

    Ok(())
}

/// Noindex and client-rendered routes never reach a sitemap.
fn enforce_exclusion(desc: &mut ResolvedSeoDescriptor) {
    if !desc.robots.index || desc.render_mode == RenderMode::Client {
        desc.sitemap.excluded = true;
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `Home` for `/`, otherwise the last segment in title case.
///
/// `/terms-of-service` → `Terms Of Service`
fn default_admin_title(route_path: &str) -> String {
    let segment = route_path.rsplit('/').next().unwrap_or_default();
    if segment.is_empty() {
        return "Home".into();
    }
    segment
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
