//! In-memory bookstore served by the binary.
//!
//! ```text
//! /health                      GET
//! /books                       GET (?author=), POST
//! /books/search                GET (?q=)
//! /books/{id}                  GET, PUT, DELETE
//! /books/{id}/reviews          locator → reviews: GET, POST
//! /books/{id}/reviews/{review} GET
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use axum::http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rest_dispatcher::dispatch::{DispatchError, MediaType, RequestContext, Response};
use rest_dispatcher::resource::{
    RegistryError, Resource, ResourceError, ResourceMethod, ResourceRegistry,
};
use rest_dispatcher::uri::UriBuilder;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub id: u64,
    pub title: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: u64,
    pub rating: u8,
    pub text: String,
}

#[derive(Debug, Default)]
struct Shelf {
    book: Option<Book>,
    reviews: Vec<Review>,
}

#[derive(Debug, Default)]
pub struct Store {
    shelves: RwLock<BTreeMap<u64, Shelf>>,
    next_id: AtomicU64,
}

impl Store {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn books(&self) -> Vec<Book> {
        let shelves = self.shelves.read().unwrap_or_else(PoisonError::into_inner);
        shelves.values().filter_map(|s| s.book.clone()).collect()
    }

    fn book(&self, id: u64) -> Option<Book> {
        let shelves = self.shelves.read().unwrap_or_else(PoisonError::into_inner);
        shelves.get(&id).and_then(|s| s.book.clone())
    }

    fn insert(&self, mut book: Book) -> Book {
        book.id = self.next_id();
        let mut shelves = self.shelves.write().unwrap_or_else(PoisonError::into_inner);
        shelves.entry(book.id).or_default().book = Some(book.clone());
        book
    }

    fn replace(&self, id: u64, mut book: Book) -> Option<Book> {
        book.id = id;
        let mut shelves = self.shelves.write().unwrap_or_else(PoisonError::into_inner);
        let shelf = shelves.get_mut(&id).filter(|s| s.book.is_some())?;
        shelf.book = Some(book.clone());
        Some(book)
    }

    fn remove(&self, id: u64) -> bool {
        let mut shelves = self.shelves.write().unwrap_or_else(PoisonError::into_inner);
        shelves.remove(&id).and_then(|s| s.book).is_some()
    }

    fn reviews(&self, book: u64) -> Vec<Review> {
        let shelves = self.shelves.read().unwrap_or_else(PoisonError::into_inner);
        shelves.get(&book).map(|s| s.reviews.clone()).unwrap_or_default()
    }

    fn add_review(&self, book: u64, mut review: Review) -> Option<Review> {
        let mut shelves = self.shelves.write().unwrap_or_else(PoisonError::into_inner);
        let shelf = shelves.get_mut(&book).filter(|s| s.book.is_some())?;
        review.id = shelf.reviews.len() as u64 + 1;
        shelf.reviews.push(review.clone());
        Some(review)
    }
}

fn book_id(ctx: &RequestContext) -> Result<u64, DispatchError> {
    ctx.parse_path_param("id")
}

fn missing(ctx: &RequestContext) -> DispatchError {
    DispatchError::not_found(ctx.path())
}

fn json() -> MediaType {
    MediaType::application_json()
}

/// Registers every bookstore resource.
pub fn registry() -> Result<ResourceRegistry, SetupError> {
    let store = Arc::new(Store::default());
    let registry = ResourceRegistry::new();
    registry.register(health()?)?;
    registry.register(books(store)?)?;
    Ok(registry)
}

fn health() -> Result<Resource, ResourceError> {
    Resource::builder("health", "/health")
        .get(|_: &RequestContext| -> Result<Response, DispatchError> { Ok(Response::ok().text("ok")) })
        .build()
}

fn books(store: Arc<Store>) -> Result<Resource, ResourceError> {
    let list = {
        let store = store.clone();
        move |ctx: &RequestContext| -> Result<Response, DispatchError> {
            let mut books = store.books();
            if let Some(author) = ctx.query_param("author") {
                books.retain(|b| b.author.eq_ignore_ascii_case(author));
            }
            Response::ok().json(&books)
        }
    };
    let create = {
        let store = store.clone();
        move |ctx: &RequestContext| -> Result<Response, DispatchError> {
            let book = store.insert(ctx.entity::<Book>()?);
            let location = UriBuilder::from_path("/books/{id}").build(&[book.id])?;
            tracing::info!(id = book.id, title = %book.title, "Book created");
            Response::created(&location)?.json(&book)
        }
    };
    let search = {
        let store = store.clone();
        move |ctx: &RequestContext| -> Result<Response, DispatchError> {
            let needle = ctx
                .query_param("q")
                .ok_or_else(|| DispatchError::BadRequest("missing query parameter q".to_string()))?
                .to_lowercase();
            let hits: Vec<Book> = store
                .books()
                .into_iter()
                .filter(|b| b.title.to_lowercase().contains(&needle))
                .collect();
            Response::ok().json(&hits)
        }
    };
    let show = {
        let store = store.clone();
        move |ctx: &RequestContext| -> Result<Response, DispatchError> {
            let book = store.book(book_id(ctx)?).ok_or_else(|| missing(ctx))?;
            Response::ok().json(&book)
        }
    };
    let update = {
        let store = store.clone();
        move |ctx: &RequestContext| -> Result<Response, DispatchError> {
            let book = store
                .replace(book_id(ctx)?, ctx.entity::<Book>()?)
                .ok_or_else(|| missing(ctx))?;
            Response::ok().json(&book)
        }
    };
    let delete = {
        let store = store.clone();
        move |ctx: &RequestContext| -> Result<Response, DispatchError> {
            if store.remove(book_id(ctx)?) {
                Ok(Response::no_content())
            } else {
                Err(missing(ctx))
            }
        }
    };

    let reviews = reviews(store.clone())?;
    let locate_reviews = move |ctx: &RequestContext| -> Option<Arc<Resource>> {
        let id = book_id(ctx).ok()?;
        store.book(id).map(|_| reviews.clone())
    };

    Resource::builder("books", "/books")
        .method(ResourceMethod::new(Method::GET, list).produces(json()))
        .method(
            ResourceMethod::new(Method::POST, create)
                .consumes(json())
                .produces(json()),
        )
        .sub_resource_method("search", ResourceMethod::new(Method::GET, search).produces(json()))
        .sub_resource_method("{id}", ResourceMethod::new(Method::GET, show).produces(json()))
        .sub_resource_method(
            "{id}",
            ResourceMethod::new(Method::PUT, update)
                .consumes(json())
                .produces(json()),
        )
        .sub_resource_method("{id}", ResourceMethod::new(Method::DELETE, delete))
        .sub_resource_locator("{id}/reviews", locate_reviews)
        .build()
}

fn reviews(store: Arc<Store>) -> Result<Arc<Resource>, ResourceError> {
    let list = {
        let store = store.clone();
        move |ctx: &RequestContext| -> Result<Response, DispatchError> {
            Response::ok().json(&store.reviews(book_id(ctx)?))
        }
    };
    let add = {
        let store = store.clone();
        move |ctx: &RequestContext| -> Result<Response, DispatchError> {
            let id = book_id(ctx)?;
            let review: Review = ctx.entity()?;
            if !(1..=5).contains(&review.rating) {
                return Err(DispatchError::BadRequest("rating must be between 1 and 5".to_string()));
            }
            let review = store.add_review(id, review).ok_or_else(|| missing(ctx))?;
            let location = UriBuilder::from_path("/books/{id}/reviews/{review}").build(&[id, review.id])?;
            Response::created(&location)?.json(&review)
        }
    };
    let show = move |ctx: &RequestContext| -> Result<Response, DispatchError> {
        let review_id: u64 = ctx.parse_path_param("review")?;
        let review = store
            .reviews(book_id(ctx)?)
            .into_iter()
            .find(|r| r.id == review_id)
            .ok_or_else(|| missing(ctx))?;
        Response::ok().json(&review)
    };

    Resource::sub_resource("reviews")
        .method(ResourceMethod::new(Method::GET, list).produces(json()))
        .method(
            ResourceMethod::new(Method::POST, add)
                .consumes(json())
                .produces(json()),
        )
        .sub_resource_method("{review}", ResourceMethod::new(Method::GET, show).produces(json()))
        .build_shared()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
    use rest_dispatcher::config::DispatchConfig;
    use rest_dispatcher::dispatch::{Dispatcher, Entity};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(registry().unwrap()), DispatchConfig::default())
    }

    fn send(dispatcher: &Dispatcher, method: Method, uri: &str, body: &str) -> Result<Response, DispatchError> {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut ctx = RequestContext::new(method, path)
            .with_query(query)?
            .with_headers(headers)
            .with_body(body.as_bytes().to_vec());
        dispatcher.dispatch(&mut ctx)
    }

    fn json_body(response: &Response) -> serde_json::Value {
        match response.entity() {
            Some(Entity::Json(value)) => value.clone(),
            other => panic!("unexpected entity {other:?}"),
        }
    }

    #[test]
    fn test_book_lifecycle() {
        let d = dispatcher();
        let created = send(&d, Method::POST, "/books", r#"{"title":"Dune","author":"Herbert"}"#).unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(created.headers()[header::LOCATION], "/books/1");

        let shown = send(&d, Method::GET, "/books/1", "").unwrap();
        assert_eq!(json_body(&shown)["title"], "Dune");

        let updated = send(&d, Method::PUT, "/books/1", r#"{"title":"Dune Messiah","author":"Herbert"}"#).unwrap();
        assert_eq!(json_body(&updated)["title"], "Dune Messiah");

        assert_eq!(send(&d, Method::DELETE, "/books/1", "").unwrap().status(), StatusCode::NO_CONTENT);
        assert_eq!(send(&d, Method::GET, "/books/1", "").unwrap_err().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_search_beats_id() {
        let d = dispatcher();
        send(&d, Method::POST, "/books", r#"{"title":"Dune","author":"Herbert"}"#).unwrap();
        send(&d, Method::POST, "/books", r#"{"title":"Emma","author":"Austen"}"#).unwrap();

        let hits = json_body(&send(&d, Method::GET, "/books/search?q=dun", "").unwrap());
        assert_eq!(hits.as_array().unwrap().len(), 1);

        let by_author = json_body(&send(&d, Method::GET, "/books?author=austen", "").unwrap());
        assert_eq!(by_author[0]["title"], "Emma");

        let err = send(&d, Method::GET, "/books/abc", "").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_reviews_through_locator() {
        let d = dispatcher();
        send(&d, Method::POST, "/books", r#"{"title":"Dune","author":"Herbert"}"#).unwrap();

        let created = send(&d, Method::POST, "/books/1/reviews", r#"{"rating":5,"text":"great"}"#).unwrap();
        assert_eq!(created.headers()[header::LOCATION], "/books/1/reviews/1");

        let review = json_body(&send(&d, Method::GET, "/books/1/reviews/1", "").unwrap());
        assert_eq!(review["text"], "great");

        let bad = send(&d, Method::POST, "/books/1/reviews", r#"{"rating":9,"text":"?"}"#).unwrap_err();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let missing = send(&d, Method::GET, "/books/9/reviews", "").unwrap_err();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
