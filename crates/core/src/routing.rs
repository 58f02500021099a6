//! Route topology planning.
//!
//! A single resource is mounted at the root. With several resources every
//! resource lives under its route prefix and `/` lists them.

use crate::resource::{ConfigError, ResourceMap};

/// Path prefixes owned by the application itself.
pub const SHARED_PREFIXES: [&str; 3] = ["/livez", "/static", "/images"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// One resource, mounted at `/`.
    Root,
    /// Several resources, each under its route prefix.
    Prefixed,
}

/// The paths and route names of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRoutes {
    pub resource: String,
    /// Prefix prepended to every path; empty at the root.
    pub base: String,
    pub form: String,
    /// `<prefix>` without the trailing slash, prefixed topology only.
    pub form_alias: Option<String>,
    pub reserve: String,
    pub cancel: String,
}

impl ResourceRoutes {
    fn new(resource: &str, base: &str) -> Self {
        Self {
            resource: resource.to_string(),
            base: base.to_string(),
            form: format!("{base}/"),
            form_alias: (!base.is_empty()).then(|| base.to_string()),
            reserve: format!("{base}/reserve"),
            cancel: format!("{base}/cancel"),
        }
    }

    pub fn form_name(&self) -> String {
        format!("get_form_{}", self.resource)
    }

    pub fn submit_name(&self) -> String {
        format!("submit_{}", self.resource)
    }

    pub fn cancel_name(&self) -> String {
        format!("cancel_{}", self.resource)
    }

    /// Every path registered for this resource.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths = vec![self.form.as_str()];
        if let Some(alias) = &self.form_alias {
            paths.push(alias);
        }
        paths.push(&self.reserve);
        paths.push(&self.cancel);
        paths
    }
}

/// The full route layout derived from the loaded resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    pub topology: Topology,
    pub resources: Vec<ResourceRoutes>,
}

impl RoutePlan {
    /// Plans the routes of `resources`.
    ///
    /// Fails if two resources would share a path or a resource prefix
    /// shadows an application path.
    pub fn plan(resources: &ResourceMap) -> Result<Self, ConfigError> {
        if resources.len() == 1 {
            let routes = resources
                .iter()
                .map(|resource| ResourceRoutes::new(&resource.file_prefix, ""))
                .collect();
            return Ok(Self {
                topology: Topology::Root,
                resources: routes,
            });
        }

        let mut seen: Vec<&str> = Vec::with_capacity(resources.len());
        let mut routes = Vec::with_capacity(resources.len());
        for resource in resources {
            let prefix = resource.route_prefix.as_str();
            let shadows_shared = SHARED_PREFIXES
                .iter()
                .any(|shared| nests_under(prefix, shared));
            let overlaps_other = seen
                .iter()
                .any(|other| nests_under(prefix, other) || nests_under(other, prefix));
            if shadows_shared || overlaps_other {
                return Err(ConfigError::InvalidRoutePrefix(prefix.to_string()));
            }
            seen.push(prefix);
            routes.push(ResourceRoutes::new(&resource.file_prefix, prefix));
        }

        Ok(Self {
            topology: Topology::Prefixed,
            resources: routes,
        })
    }

    /// Whether `/` serves the resource listing.
    pub fn has_home(&self) -> bool {
        self.topology == Topology::Prefixed
    }

    pub fn for_resource(&self, identity: &str) -> Option<&ResourceRoutes> {
        self.resources
            .iter()
            .find(|routes| routes.resource == identity)
    }
}

/// Whether `path` is `base` or lies below it, segment-wise.
fn nests_under(path: &str, base: &str) -> bool {
    path.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
