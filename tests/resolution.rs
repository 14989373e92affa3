//! Root resource selection and sub-resource descent through the public API.

use axum::http::Method;
use pretty_assertions::assert_eq;
use rest_dispatcher::dispatch::{DispatchError, RequestContext};
use rest_dispatcher::resource::{Resource, ResourceRegistry, ResourceResolver};
use rest_dispatcher::uri::UriBuilder;

mod common;

fn registry(templates: &[(&str, &str)]) -> ResourceRegistry {
    ResourceRegistry::with_resources(templates.iter().map(|(name, template)| {
        Resource::builder(*name, template)
            .get(common::text("ok"))
            .build()
            .unwrap()
    }))
    .unwrap()
}

fn resolve(registry: &ResourceRegistry, path: &str) -> Option<(String, Vec<Option<String>>)> {
    let resolver = ResourceResolver::new(registry.snapshot());
    let mut out = Vec::new();
    resolver
        .resolve(path, &mut out)
        .map(|resource| (resource.name().to_string(), out))
}

#[test]
fn test_literal_template_preferred() {
    let registry = registry(&[("var", "/a/{x}"), ("lit", "/a/b")]);
    assert_eq!(resolve(&registry, "/a/b").unwrap().0, "lit");
    assert_eq!(
        resolve(&registry, "/a/z").unwrap(),
        ("var".to_string(), vec![Some("z".to_string()), None])
    );
}

#[test]
fn test_partial_match_needs_sub_resources() {
    let registry = registry(&[("two", "/{a}/{b}"), ("one", "/{a}")]);
    assert_eq!(resolve(&registry, "/x").unwrap().0, "one");
    assert_eq!(resolve(&registry, "/x/y").unwrap().0, "two");
}

#[test]
fn test_registration_order_irrelevant() {
    let forward = registry(&[("x", "/{x}/c"), ("y", "/a/{y}")]);
    let backward = registry(&[("y", "/a/{y}"), ("x", "/{x}/c")]);
    assert_eq!(resolve(&forward, "/a/c").unwrap().0, resolve(&backward, "/a/c").unwrap().0);
}

#[test]
fn test_unmatched_leaves_buffer() {
    let registry = registry(&[("books", "/books")]);
    let resolver = ResourceResolver::new(registry.snapshot());
    let mut out = vec![Some("previous".to_string())];
    assert!(resolver.resolve("/books/123", &mut out).is_none());
    assert!(resolver.resolve("", &mut out).is_none());
    assert_eq!(out, vec![Some("previous".to_string())]);
}

#[test]
fn test_snapshot_isolated_from_later_registration() {
    let registry = registry(&[("books", "/books")]);
    let resolver = ResourceResolver::new(registry.snapshot());
    registry
        .register(Resource::builder("authors", "/authors").build().unwrap())
        .unwrap();

    let mut out = Vec::new();
    assert!(resolver.resolve("/authors", &mut out).is_none());
    assert!(resolve(&registry, "/authors").is_some());
}

#[test]
fn test_locator_descent_binds_all_params() {
    let registry = common::library();
    let resolver = ResourceResolver::new(registry.snapshot());

    let mut ctx = RequestContext::new(Method::GET, "/authors/ada/books/notes/");
    let target = resolver.resolve_target(&mut ctx).unwrap();
    assert_eq!(target.resource().name(), "book");
    assert_eq!(target.template(), "/authors/{author}/books/{book}");
    assert_eq!(ctx.path_param("author"), Some("ada"));
    assert_eq!(ctx.path_param("book"), Some("notes"));

    let mut ctx = RequestContext::new(Method::GET, "/authors/nobody/books/notes");
    assert!(matches!(
        resolver.resolve_target(&mut ctx),
        Err(DispatchError::NotFound { .. })
    ));
}

#[test]
fn test_built_uri_resolves_back() {
    let registry = common::library();
    let resolver = ResourceResolver::new(registry.snapshot());
    let path = UriBuilder::from_path("/authors/{author}/books/{book}")
        .build(&["Ada Lovelace", "notes on the engine"])
        .unwrap();
    assert_eq!(path, "/authors/Ada%20Lovelace/books/notes%20on%20the%20engine");

    let mut ctx = RequestContext::new(Method::GET, path);
    resolver.resolve_target(&mut ctx).unwrap();
    assert_eq!(ctx.path_param("author"), Some("Ada Lovelace"));
    assert_eq!(ctx.path_param("book"), Some("notes on the engine"));
}
