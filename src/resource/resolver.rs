//! Resource resolution.
//!
//! # Responsibilities
//! - Pick the most specific root resource for a request path
//! - Descend through sub-resource methods and locators with the remainder
//! - Bind path parameters into the request context on the way down
//!
//! # Design Decisions
//! - Candidates are ranked with `UriPattern`'s ordering (smallest wins)
//! - A partial root match only counts if the resource has sub-resources
//! - A sub-resource method beats a locator with an equal pattern
//! - Descent depth is bounded by the resource tree, not by a counter

use std::sync::Arc;

use crate::dispatch::{DispatchError, RequestContext};
use crate::resource::descriptor::{Resource, ResourceMethod};
use crate::resource::registry::Snapshot;
use crate::uri::{is_terminal, UriPattern};

/// The end point of a resolution: the resource reached and the methods that
/// may serve the request.
#[derive(Debug, Clone)]
pub struct Target {
    resource: Arc<Resource>,
    methods: Vec<ResourceMethod>,
    template: String,
}

impl Target {
    pub fn resource(&self) -> &Arc<Resource> {
        &self.resource
    }

    /// Candidate methods, in declaration order.
    pub fn methods(&self) -> &[ResourceMethod] {
        &self.methods
    }

    /// Concatenation of every template matched on the way down.
    pub fn template(&self) -> &str {
        &self.template
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubMatch {
    Methods(usize),
    Locator(usize),
}

/// Resolves paths against one registry snapshot.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    resources: Snapshot,
    decode_params: bool,
}

impl ResourceResolver {
    pub fn new(resources: Snapshot) -> Self {
        Self {
            resources,
            decode_params: true,
        }
    }

    /// Whether bound path parameters are percent-decoded.
    pub fn decode_params(mut self, decode: bool) -> Self {
        self.decode_params = decode;
        self
    }

    /// Finds the best root resource for `path`.
    ///
    /// On success `out` holds the winner's values followed by the remainder.
    /// On failure `out` is untouched.
    pub fn resolve(&self, path: &str, out: &mut Vec<Option<String>>) -> Option<Arc<Resource>> {
        let mut scratch = Vec::new();
        let mut best: Option<(&Arc<Resource>, Vec<Option<String>>)> = None;
        let mut candidates = 0usize;

        for resource in self.resources.iter() {
            if !resource.pattern().matches(path, &mut scratch) {
                continue;
            }
            let remainder = scratch.last().and_then(|v| v.as_deref());
            if !is_terminal(remainder) && !resource.has_sub_resources() {
                continue;
            }
            candidates += 1;
            let better = match &best {
                None => true,
                Some((current, _)) => resource.pattern() < current.pattern(),
            };
            if better {
                best = Some((resource, std::mem::take(&mut scratch)));
            }
        }

        let (resource, values) = best?;
        tracing::trace!(
            path = %path,
            candidates,
            resource = %resource.name(),
            "Root resource selected"
        );
        out.clear();
        out.extend(values);
        Some(Arc::clone(resource))
    }

    /// Resolves the request path down to a set of candidate methods,
    /// binding path parameters into `ctx`.
    pub fn resolve_target(&self, ctx: &mut RequestContext) -> Result<Target, DispatchError> {
        let path = ctx.path().to_string();
        let not_found = || DispatchError::not_found(path.as_str());

        let mut values = Vec::new();
        let mut resource = self.resolve(&path, &mut values).ok_or_else(not_found)?;
        let mut template = resource.pattern().template().to_string();
        self.bind(ctx, resource.pattern(), &values)?;
        let mut remainder = values.pop().flatten();

        loop {
            let rest = match remainder.as_deref() {
                rest if is_terminal(rest) => {
                    if resource.methods().is_empty() {
                        return Err(not_found());
                    }
                    let methods = resource.methods().to_vec();
                    return Ok(Target {
                        resource,
                        methods,
                        template,
                    });
                }
                Some(rest) => rest,
                None => return Err(not_found()),
            };

            match select_sub_resource(&resource, rest, &mut values) {
                None => return Err(not_found()),
                Some(SubMatch::Methods(index)) => {
                    let pattern = resource.sub_resource_methods()[index].pattern().clone();
                    self.bind(ctx, &pattern, &values)?;
                    template.push_str(pattern.template());
                    let methods = resource
                        .sub_resource_methods()
                        .iter()
                        .filter(|sub| *sub.pattern() == pattern)
                        .map(|sub| sub.method().clone())
                        .collect();
                    return Ok(Target {
                        resource,
                        methods,
                        template,
                    });
                }
                Some(SubMatch::Locator(index)) => {
                    let locator = resource.sub_resource_locators()[index].clone();
                    self.bind(ctx, locator.pattern(), &values)?;
                    template.push_str(locator.pattern().template());
                    remainder = values.pop().flatten();
                    resource = locator.locate(ctx).ok_or_else(not_found)?;
                    tracing::trace!(
                        locator = %locator.pattern().template(),
                        resource = %resource.name(),
                        remainder = ?remainder,
                        "Sub-resource located"
                    );
                }
            }
        }
    }

    fn bind(
        &self,
        ctx: &mut RequestContext,
        pattern: &UriPattern,
        values: &[Option<String>],
    ) -> Result<(), DispatchError> {
        let params = ctx.path_params_mut();
        for (name, value) in pattern.parameter_names().iter().zip(values) {
            let Some(value) = value else { continue };
            if self.decode_params {
                let decoded = urlencoding::decode(value).map_err(|_| {
                    DispatchError::BadRequest(format!("path parameter {name} is not valid UTF-8"))
                })?;
                params.push(name.as_str(), decoded.into_owned());
            } else {
                params.push(name.as_str(), value.as_str());
            }
        }
        Ok(())
    }
}

/// Matches `remainder` against the sub-resource methods (full matches only)
/// and locators of `resource`; `out` receives the winner's values.
fn select_sub_resource(
    resource: &Resource,
    remainder: &str,
    out: &mut Vec<Option<String>>,
) -> Option<SubMatch> {
    let mut scratch = Vec::new();
    let mut best: Option<(&UriPattern, bool, SubMatch, Vec<Option<String>>)> = None;

    let methods = resource
        .sub_resource_methods()
        .iter()
        .enumerate()
        .map(|(i, sub)| (sub.pattern(), false, SubMatch::Methods(i)));
    let locators = resource
        .sub_resource_locators()
        .iter()
        .enumerate()
        .map(|(i, loc)| (loc.pattern(), true, SubMatch::Locator(i)));

    for (pattern, is_locator, candidate) in methods.chain(locators) {
        if !pattern.matches(remainder, &mut scratch) {
            continue;
        }
        let terminal = is_terminal(scratch.last().and_then(|v| v.as_deref()));
        if !is_locator && !terminal {
            continue;
        }
        let better = match &best {
            None => true,
            Some((current, current_is_locator, _, _)) => {
                (pattern, is_locator) < (*current, *current_is_locator)
            }
        };
        if better {
            best = Some((pattern, is_locator, candidate, std::mem::take(&mut scratch)));
        }
    }

    let (_, _, selected, values) = best?;
    out.clear();
    out.extend(values);
    Some(selected)
}
