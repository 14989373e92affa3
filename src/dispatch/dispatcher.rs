//! Method selection and handler invocation.
//!
//! # Responsibilities
//! - Resolve the request path against the current registry snapshot
//! - Narrow the candidate methods by HTTP method, `Content-Type` and `Accept`
//! - Invoke the selected handler and set the negotiated `Content-Type`
//!
//! # Design Decisions
//! - HEAD falls back to GET and OPTIONS is answered automatically, both
//!   switchable through `DispatchConfig`
//! - An absent `Content-Type` is treated as `*/*`
//! - Ties between equally good methods go to the first declared

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};

use crate::config::schema::DispatchConfig;
use crate::dispatch::context::RequestContext;
use crate::dispatch::error::DispatchError;
use crate::dispatch::media::{parse_accept, MediaType};
use crate::dispatch::response::Response;
use crate::observability::metrics;
use crate::resource::{ResourceMethod, ResourceRegistry, ResourceResolver, Target};

/// A method that survived negotiation, with the media type it will write.
struct Selection<'a> {
    method: &'a ResourceMethod,
    media: Option<MediaType>,
}

/// Routes requests to resource methods.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ResourceRegistry>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<ResourceRegistry>, config: DispatchConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn dispatch(&self, ctx: &mut RequestContext) -> Result<Response, DispatchError> {
        let resolver = ResourceResolver::new(self.registry.snapshot())
            .decode_params(self.config.decode_path_params);

        let target = match resolver.resolve_target(ctx) {
            Ok(target) => target,
            Err(e) => {
                if matches!(e, DispatchError::NotFound { .. }) {
                    metrics::record_unmatched();
                    tracing::debug!(path = %ctx.path(), "No resource matched");
                }
                return Err(e);
            }
        };

        tracing::debug!(
            method = %ctx.method(),
            path = %ctx.path(),
            resource = %target.resource().name(),
            template = %target.template(),
            "Resource resolved"
        );

        let selection = match self.select(&target, ctx)? {
            Some(selection) => selection,
            None => return Ok(self.options_response(&target)),
        };

        let mut response = selection.method.invoke(ctx).inspect_err(|e| {
            if e.status().is_server_error() {
                tracing::error!(
                    resource = %target.resource().name(),
                    error = %e,
                    "Handler failed"
                );
            } else {
                tracing::warn!(
                    resource = %target.resource().name(),
                    error = %e,
                    "Handler rejected request"
                );
            }
        })?;

        if response.entity().is_some() && response.content_type().is_none() {
            let media = selection
                .media
                .or_else(|| response.entity().map(|e| e.default_media_type()));
            if let Some(media) = media {
                let value = HeaderValue::from_str(&media.to_string())
                    .map_err(|e| DispatchError::Internal(format!("invalid media type {media}: {e}")))?;
                response.headers_mut().insert(header::CONTENT_TYPE, value);
            }
        }
        Ok(response)
    }

    /// Picks the method to invoke. `Ok(None)` means the request is an OPTIONS
    /// request to be answered automatically.
    fn select<'t>(
        &self,
        target: &'t Target,
        ctx: &RequestContext,
    ) -> Result<Option<Selection<'t>>, DispatchError> {
        let method = ctx.method();
        let mut candidates: Vec<&ResourceMethod> = target
            .methods()
            .iter()
            .filter(|m| m.http_method() == method)
            .collect();

        if candidates.is_empty() && *method == Method::HEAD && self.config.head_fallback {
            candidates = target
                .methods()
                .iter()
                .filter(|m| *m.http_method() == Method::GET)
                .collect();
        }

        if candidates.is_empty() {
            if *method == Method::OPTIONS && self.config.auto_options {
                return Ok(None);
            }
            return Err(DispatchError::MethodNotAllowed {
                method: method.clone(),
                allow: self.allowed_methods(target),
            });
        }

        let content_type = ctx.content_type()?.unwrap_or_else(MediaType::wildcard);
        candidates.retain(|m| accepts(m.consumed(), &content_type));
        if candidates.is_empty() {
            return Err(DispatchError::UnsupportedMediaType(content_type.essence()));
        }

        let accept = parse_accept(ctx.header(header::ACCEPT.as_str()))?;
        let mut best: Option<(Score, Selection<'t>)> = None;
        for candidate in candidates {
            let Some((score, media)) = negotiate(candidate.produced(), &accept) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((current, _)) => score > *current,
            };
            if better {
                best = Some((
                    score,
                    Selection {
                        method: candidate,
                        media,
                    },
                ));
            }
        }

        best.map(|(_, selection)| Some(selection))
            .ok_or(DispatchError::NotAcceptable)
    }

    /// Methods the target answers, in declaration order.
    fn allowed_methods(&self, target: &Target) -> Vec<Method> {
        let mut allow: Vec<Method> = Vec::new();
        let mut add = |method: Method| {
            if !allow.contains(&method) {
                allow.push(method);
            }
        };
        for method in target.methods() {
            add(method.http_method().clone());
        }
        if self.config.head_fallback && target.methods().iter().any(|m| *m.http_method() == Method::GET) {
            add(Method::HEAD);
        }
        if self.config.auto_options {
            add(Method::OPTIONS);
        }
        allow
    }

    fn options_response(&self, target: &Target) -> Response {
        let allow = join_methods(&self.allowed_methods(target));
        let mut response = Response::ok();
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response.headers_mut().insert(header::ALLOW, value);
        }
        response
    }
}

/// `Allow` header value.
pub fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn accepts(consumed: &[MediaType], content_type: &MediaType) -> bool {
    consumed.is_empty() || consumed.iter().any(|m| m.is_compatible(content_type))
}

/// Client quality (in thousandths), range specificity, produced specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Score(u16, u8, u8);

/// Best pairing of an accepted range with a produced type.
fn negotiate(produced: &[MediaType], accept: &[MediaType]) -> Option<(Score, Option<MediaType>)> {
    let wildcard = [MediaType::wildcard()];
    let produced = if produced.is_empty() { &wildcard[..] } else { produced };

    let mut best: Option<(Score, Option<MediaType>)> = None;
    for range in accept {
        for media in produced {
            if !media.is_compatible(range) {
                continue;
            }
            let score = Score(
                (range.quality() * 1000.0).round() as u16,
                range.specificity(),
                media.specificity(),
            );
            if best.as_ref().is_some_and(|(current, _)| score <= *current) {
                continue;
            }
            let negotiated = if media.is_concrete() {
                Some(media.clone())
            } else if range.is_concrete() {
                Some(range.without_params())
            } else {
                None
            };
            best = Some((score, negotiated));
        }
    }
    best
}
