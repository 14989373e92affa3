//! Resource descriptors.
//!
//! # Responsibilities
//! - Describe a resource: its path pattern, resource methods, sub-resource
//!   methods and sub-resource locators
//! - Compile every template when the resource is built
//! - Reject ambiguous method declarations before registration
//!
//! A resource method handles requests for the resource's own path. A
//! sub-resource method handles a path relative to it. A sub-resource locator
//! matches a relative path and returns another resource that continues the
//! resolution with whatever path is left.

use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::dispatch::{DispatchError, MediaType, MediaTypeError, RequestContext, Response};
use crate::uri::{TemplateError, UriPattern};

/// Invoked for a selected resource method.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &RequestContext) -> Result<Response, DispatchError>;
}

impl<F> Handler for F
where
    F: Fn(&RequestContext) -> Result<Response, DispatchError> + Send + Sync,
{
    fn handle(&self, ctx: &RequestContext) -> Result<Response, DispatchError> {
        self(ctx)
    }
}

/// Produces the resource that continues path resolution.
pub trait Locator: Send + Sync {
    fn locate(&self, ctx: &RequestContext) -> Option<Arc<Resource>>;
}

impl<F> Locator for F
where
    F: Fn(&RequestContext) -> Option<Arc<Resource>> + Send + Sync,
{
    fn locate(&self, ctx: &RequestContext) -> Option<Arc<Resource>> {
        self(ctx)
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    MediaType(#[from] MediaTypeError),

    #[error("resource {resource}: {method} {template} is declared twice with the same media types")]
    DuplicateMethod {
        resource: String,
        method: Method,
        template: String,
    },
}

/// An HTTP method bound to a handler, with the media types it reads and
/// writes. Empty `consumes`/`produces` lists mean `*/*`.
#[derive(Clone)]
pub struct ResourceMethod {
    http_method: Method,
    consumes: Vec<MediaType>,
    produces: Vec<MediaType>,
    handler: Arc<dyn Handler>,
}

impl ResourceMethod {
    pub fn new(http_method: Method, handler: impl Handler + 'static) -> Self {
        Self {
            http_method,
            consumes: Vec::new(),
            produces: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn consumes(mut self, media: MediaType) -> Self {
        self.consumes.push(media);
        self
    }

    pub fn produces(mut self, media: MediaType) -> Self {
        self.produces.push(media);
        self
    }

    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    pub fn consumed(&self) -> &[MediaType] {
        &self.consumes
    }

    pub fn produced(&self) -> &[MediaType] {
        &self.produces
    }

    pub fn invoke(&self, ctx: &RequestContext) -> Result<Response, DispatchError> {
        self.handler.handle(ctx)
    }

    fn conflicts_with(&self, other: &ResourceMethod) -> bool {
        self.http_method == other.http_method
            && same_media(&self.consumes, &other.consumes)
            && same_media(&self.produces, &other.produces)
    }
}

fn same_media(a: &[MediaType], b: &[MediaType]) -> bool {
    let wildcard = [MediaType::wildcard()];
    let a = if a.is_empty() { &wildcard[..] } else { a };
    let b = if b.is_empty() { &wildcard[..] } else { b };
    a.len() == b.len() && a.iter().all(|m| b.iter().any(|n| m.essence() == n.essence()))
}

impl fmt::Debug for ResourceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceMethod")
            .field("http_method", &self.http_method)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

/// A resource method reached through a path relative to its resource.
#[derive(Debug, Clone)]
pub struct SubResourceMethod {
    pattern: UriPattern,
    method: ResourceMethod,
}

impl SubResourceMethod {
    pub fn pattern(&self) -> &UriPattern {
        &self.pattern
    }

    pub fn method(&self) -> &ResourceMethod {
        &self.method
    }
}

#[derive(Clone)]
pub struct SubResourceLocator {
    pattern: UriPattern,
    locator: Arc<dyn Locator>,
}

impl SubResourceLocator {
    pub fn pattern(&self) -> &UriPattern {
        &self.pattern
    }

    pub fn locate(&self, ctx: &RequestContext) -> Option<Arc<Resource>> {
        self.locator.locate(ctx)
    }
}

impl fmt::Debug for SubResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubResourceLocator")
            .field("pattern", &self.pattern.template())
            .finish_non_exhaustive()
    }
}

/// A node of the resource tree.
#[derive(Debug)]
pub struct Resource {
    name: String,
    pattern: UriPattern,
    methods: Vec<ResourceMethod>,
    sub_resource_methods: Vec<SubResourceMethod>,
    sub_resource_locators: Vec<SubResourceLocator>,
}

impl Resource {
    /// Starts a root resource mounted at `template`.
    pub fn builder(name: impl Into<String>, template: &str) -> ResourceBuilder {
        ResourceBuilder::new(name.into(), UriPattern::new(template).map_err(Into::into))
    }

    /// Starts a resource returned by a locator. It has no path of its own.
    pub fn sub_resource(name: impl Into<String>) -> ResourceBuilder {
        ResourceBuilder::new(name.into(), Ok(UriPattern::empty()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &UriPattern {
        &self.pattern
    }

    pub fn methods(&self) -> &[ResourceMethod] {
        &self.methods
    }

    pub fn sub_resource_methods(&self) -> &[SubResourceMethod] {
        &self.sub_resource_methods
    }

    pub fn sub_resource_locators(&self) -> &[SubResourceLocator] {
        &self.sub_resource_locators
    }

    /// Whether a partial match on this resource can continue below it.
    pub fn has_sub_resources(&self) -> bool {
        !self.sub_resource_methods.is_empty() || !self.sub_resource_locators.is_empty()
    }
}

/// Collects a resource's members. The first error is reported by
/// [`ResourceBuilder::build`].
pub struct ResourceBuilder {
    name: String,
    pattern: Result<UriPattern, ResourceError>,
    methods: Vec<ResourceMethod>,
    sub_resource_methods: Vec<SubResourceMethod>,
    sub_resource_locators: Vec<SubResourceLocator>,
    error: Option<ResourceError>,
}

impl ResourceBuilder {
    fn new(name: String, pattern: Result<UriPattern, ResourceError>) -> Self {
        Self {
            name,
            pattern,
            methods: Vec::new(),
            sub_resource_methods: Vec::new(),
            sub_resource_locators: Vec::new(),
            error: None,
        }
    }

    fn compile(&mut self, template: &str) -> Option<UriPattern> {
        match UriPattern::new(template) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                self.error.get_or_insert(e.into());
                None
            }
        }
    }

    pub fn method(mut self, method: ResourceMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn get(self, handler: impl Handler + 'static) -> Self {
        self.method(ResourceMethod::new(Method::GET, handler))
    }

    pub fn post(self, handler: impl Handler + 'static) -> Self {
        self.method(ResourceMethod::new(Method::POST, handler))
    }

    pub fn put(self, handler: impl Handler + 'static) -> Self {
        self.method(ResourceMethod::new(Method::PUT, handler))
    }

    pub fn delete(self, handler: impl Handler + 'static) -> Self {
        self.method(ResourceMethod::new(Method::DELETE, handler))
    }

    pub fn sub_resource_method(mut self, template: &str, method: ResourceMethod) -> Self {
        if let Some(pattern) = self.compile(template) {
            self.sub_resource_methods.push(SubResourceMethod { pattern, method });
        }
        self
    }

    pub fn sub_resource_locator(mut self, template: &str, locator: impl Locator + 'static) -> Self {
        if let Some(pattern) = self.compile(template) {
            self.sub_resource_locators.push(SubResourceLocator {
                pattern,
                locator: Arc::new(locator),
            });
        }
        self
    }

    pub fn build(self) -> Result<Resource, ResourceError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let pattern = self.pattern?;
        let resource = Resource {
            name: self.name,
            pattern,
            methods: self.methods,
            sub_resource_methods: self.sub_resource_methods,
            sub_resource_locators: self.sub_resource_locators,
        };
        check_conflicts(&resource)?;
        Ok(resource)
    }

    pub fn build_shared(self) -> Result<Arc<Resource>, ResourceError> {
        self.build().map(Arc::new)
    }
}

fn check_conflicts(resource: &Resource) -> Result<(), ResourceError> {
    let duplicate = |method: &ResourceMethod, template: &str| ResourceError::DuplicateMethod {
        resource: resource.name.clone(),
        method: method.http_method.clone(),
        template: template.to_string(),
    };

    for (i, method) in resource.methods.iter().enumerate() {
        if resource.methods[..i].iter().any(|m| m.conflicts_with(method)) {
            return Err(duplicate(method, resource.pattern.template()));
        }
    }
    for (i, sub) in resource.sub_resource_methods.iter().enumerate() {
        let clash = resource.sub_resource_methods[..i]
            .iter()
            .any(|s| s.pattern == sub.pattern && s.method.conflicts_with(&sub.method));
        if clash {
            return Err(duplicate(&sub.method, sub.pattern.template()));
        }
    }
    Ok(())
}
