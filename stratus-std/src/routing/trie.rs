//! Trie-based path router with named parameters.

use std::collections::HashMap;
use std::sync::Arc;
use stratus_core::{
    BoxHandler, BoxMiddleware, DynCapture, DynHandler, DynMiddleware, Flow, HttpRequest,
    HttpResponse, Method, RouteError, Segment, invoke, run_chain,
};

/// Prefix of a named-parameter path segment.
pub const PARAM_PREFIX: char = ':';

struct RouteEntry {
    pattern: String,
    handler: BoxHandler<HttpRequest, HttpResponse>,
    middleware: Vec<BoxMiddleware>,
}

/// A trie node for one path segment.
///
/// Parameter segments share a single child per node whatever their declared
/// name; names are bound from the matched route's own pattern.
#[derive(Default)]
struct Node {
    children: HashMap<String, Node>,
    param: Option<Box<Node>>,
    routes: HashMap<Method, RouteEntry>,
}

impl Node {
    fn child_mut(&mut self, component: &str) -> &mut Node {
        if component.starts_with(PARAM_PREFIX) {
            &mut **self.param.get_or_insert_with(Box::default)
        } else {
            self.children.entry(component.to_string()).or_default()
        }
    }

    /// The entry for `method`, with `HEAD` served by `GET` when it has no
    /// entry of its own. The flag is set when the body must be stripped.
    fn entry(&self, method: Method) -> Option<(&RouteEntry, bool)> {
        match self.routes.get(&method) {
            Some(entry) => Some((entry, false)),
            None if method == Method::Head => {
                self.routes.get(&Method::Get).map(|entry| (entry, true))
            }
            None => None,
        }
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.values().chain(self.param.as_deref())
    }

    fn count(&self) -> usize {
        1 + self.nodes().map(Node::count).sum::<usize>()
    }

    fn routes(&self) -> usize {
        self.routes.len() + self.nodes().map(Node::routes).sum::<usize>()
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Bind the parameter names of `pattern` to the segments of `path`.
///
/// Both must have the same number of segments, as they do once traversal
/// consumed the whole path.
fn bind_params(pattern: &str, path: &str) -> HashMap<String, String> {
    segments(pattern)
        .zip(segments(path))
        .filter_map(|(declared, actual)| {
            declared
                .strip_prefix(PARAM_PREFIX)
                .map(|name| (name.to_string(), actual.to_string()))
        })
        .collect()
}

/// A route that a request would reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'r> {
    /// The pattern the route was registered with.
    pub pattern: &'r str,
    /// Captured named parameters.
    pub params: HashMap<String, String>,
}

/// A router for HTTP requests, keyed by method and path.
///
/// Paths are split on `/` into segments; a segment starting with `:` is a
/// named parameter that matches any single segment and binds it to
/// [`HttpRequest::path_parameters`]. At each depth a literal segment wins
/// over a parameter.
///
/// Requests that match no route reach the fallthrough handler, which answers
/// `404 Not Found` unless replaced.
///
/// # Example
///
/// ```rust
/// use stratus_core::{BoxError, HttpRequest, Method};
/// use stratus_std::routing::HttpRouter;
///
/// let mut router = HttpRouter::new();
/// router
///     .get("/users/:id", |request: HttpRequest| async move {
///         Ok::<_, BoxError>(format!("user {}", request.param("id").unwrap_or_default()))
///     })
///     .unwrap();
/// assert_eq!(router.len(), 1);
/// ```
#[derive(Default)]
pub struct HttpRouter {
    root: Node,
    middleware: Vec<BoxMiddleware>,
    fallthrough: Option<BoxHandler<HttpRequest, HttpResponse>>,
}

impl HttpRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `path`.
    ///
    /// Registering the same method and path again replaces the handler.
    pub fn route<H>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        H: DynHandler<HttpRequest, HttpResponse>,
    {
        self.route_with(method, path, handler, Vec::new())
    }

    /// Register `handler` behind a chain of route middleware.
    pub fn route_with<H>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
        middleware: Vec<BoxMiddleware>,
    ) -> Result<&mut Self, RouteError>
    where
        H: DynHandler<HttpRequest, HttpResponse>,
    {
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath(path.to_string()));
        }

        let mut node = &mut self.root;
        for segment in segments(path) {
            node = node.child_mut(segment);
        }

        let entry = RouteEntry {
            pattern: path.to_string(),
            handler: Arc::new(handler),
            middleware,
        };
        if node.routes.insert(method, entry).is_some() {
            tracing::debug!(%method, path, "route handler replaced");
        }
        Ok(self)
    }

    /// Register a `GET` route.
    pub fn get<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: DynHandler<HttpRequest, HttpResponse>,
    {
        self.route(Method::Get, path, handler)
    }

    /// Register a `HEAD` route.
    pub fn head<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: DynHandler<HttpRequest, HttpResponse>,
    {
        self.route(Method::Head, path, handler)
    }

    /// Register a `POST` route.
    pub fn post<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: DynHandler<HttpRequest, HttpResponse>,
    {
        self.route(Method::Post, path, handler)
    }

    /// Register a `PUT` route.
    pub fn put<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: DynHandler<HttpRequest, HttpResponse>,
    {
        self.route(Method::Put, path, handler)
    }

    /// Register a `PATCH` route.
    pub fn patch<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: DynHandler<HttpRequest, HttpResponse>,
    {
        self.route(Method::Patch, path, handler)
    }

    /// Register a `DELETE` route.
    pub fn delete<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: DynHandler<HttpRequest, HttpResponse>,
    {
        self.route(Method::Delete, path, handler)
    }

    /// Register an `OPTIONS` route.
    pub fn options<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: DynHandler<HttpRequest, HttpResponse>,
    {
        self.route(Method::Options, path, handler)
    }

    /// Add router-wide middleware. It runs on every matched route, before
    /// the route's own middleware.
    pub fn layer<M: DynMiddleware>(&mut self, middleware: M) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Replace the handler for requests that match no route.
    pub fn fallthrough<H>(&mut self, handler: H) -> &mut Self
    where
        H: DynHandler<HttpRequest, HttpResponse>,
    {
        self.fallthrough = Some(Arc::new(handler));
        self
    }

    /// Number of trie nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.root.count()
    }

    /// Number of registered (method, path) routes.
    pub fn len(&self) -> usize {
        self.root.routes()
    }

    /// Returns `true` if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk the trie along `path`.
    ///
    /// Returns the deepest node reached and whether every segment was
    /// consumed. A literal child wins over the parameter child.
    fn traverse(&self, path: &str) -> (&Node, bool) {
        let mut node = &self.root;
        for segment in segments(path) {
            let Some(child) = node
                .children
                .get(segment)
                .or(node.param.as_deref())
            else {
                return (node, false);
            };
            node = child;
        }
        (node, true)
    }

    /// The route `method` and `path` would reach, if any.
    pub fn find(&self, method: Method, path: &str) -> Option<RouteMatch<'_>> {
        match self.traverse(path) {
            (node, true) => node.entry(method).map(|(entry, _)| RouteMatch {
                pattern: &entry.pattern,
                params: bind_params(&entry.pattern, path),
            }),
            _ => None,
        }
    }

    /// Dispatch a request.
    ///
    /// Never fails: handler and middleware errors are rendered as error
    /// responses in the format of the draft response's `Content-Type`.
    pub async fn dispatch(
        &self,
        mut request: HttpRequest,
        capture: &dyn DynCapture,
    ) -> HttpResponse {
        let method = match request.method() {
            Ok(method) => method,
            Err(error) => {
                tracing::debug!(%error, "no route for method");
                return self.fall_through(request, capture).await;
            }
        };

        let matched = match self.traverse(&request.path) {
            (node, true) => node.entry(method),
            _ => None,
        };
        let Some((entry, strip_body)) = matched else {
            tracing::debug!(%method, path = %request.path, "no route matched");
            return self.fall_through(request, capture).await;
        };

        tracing::debug!(%method, path = %request.path, pattern = %entry.pattern, "route matched");
        let params = bind_params(&entry.pattern, &request.path);
        request.path_parameters.extend(params);

        let mut draft = HttpResponse::ok();
        let mut flow = run_chain(&self.middleware, &mut request, &mut draft).await;
        if matches!(flow, Ok(Flow::Continue)) {
            flow = run_chain(&entry.middleware, &mut request, &mut draft).await;
        }
        match flow {
            Ok(Flow::Continue) => {}
            Ok(Flow::Halt(response)) => return finish(response, strip_body),
            Err(error) => {
                tracing::warn!(%error, pattern = %entry.pattern, "middleware failed");
                return HttpResponse::from_error(draft.content_type(), &*error);
            }
        }

        let segment = Segment::new("http", format!("{method} {}", entry.pattern))
            .annotate("path", request.path.clone());
        match invoke(capture, &segment, &*entry.handler, request).await {
            Ok(response) => finish(draft.merge_into(response), strip_body),
            Err(error) => {
                tracing::warn!(%error, route = %segment.name, "handler failed");
                HttpResponse::from_error(draft.content_type(), &*error)
            }
        }
    }

    async fn fall_through(&self, request: HttpRequest, capture: &dyn DynCapture) -> HttpResponse {
        let Some(handler) = &self.fallthrough else {
            return HttpResponse::not_found();
        };

        let segment = Segment::new("http", "fallthrough").annotate("path", request.path.clone());
        match invoke(capture, &segment, &**handler, request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, "fallthrough handler failed");
                HttpResponse::from_error(None, &*error)
            }
        }
    }
}

fn finish(mut response: HttpResponse, strip_body: bool) -> HttpResponse {
    if strip_body {
        response.body.clear();
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingHandler, FailingHandler, RecordingCapture};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stratus_core::{BoxError, HttpError, NoopCapture};

    fn echo_param(name: &'static str) -> impl DynHandler<HttpRequest, HttpResponse> {
        move |request: HttpRequest| async move {
            Ok::<_, BoxError>(request.param(name).unwrap_or("-").to_string())
        }
    }

    #[tokio::test]
    async fn test_registered_routes_dispatch_to_their_handlers() {
        let users = CountingHandler::new();
        let orders = CountingHandler::new();
        let mut router = HttpRouter::new();
        router.get("/users", users.clone()).unwrap();
        router.post("/orders", orders.clone()).unwrap();

        let response = router
            .dispatch(HttpRequest::new(Method::Get, "/users"), &NoopCapture)
            .await;
        assert_eq!(response.status_code, 200);
        router
            .dispatch(HttpRequest::new(Method::Post, "/orders"), &NoopCapture)
            .await;

        assert_eq!(users.count(), 1);
        assert_eq!(orders.count(), 1);
    }

    #[tokio::test]
    async fn test_named_parameter_binds_segment() {
        let mut router = HttpRouter::new();
        router.get("/users/:id", echo_param("id")).unwrap();

        let response = router
            .dispatch(HttpRequest::new(Method::Get, "/users/42"), &NoopCapture)
            .await;
        assert_eq!(response.body, "42");

        let found = router.find(Method::Get, "/users/7").unwrap();
        assert_eq!(found.pattern, "/users/:id");
        assert_eq!(found.params.get("id").map(String::as_str), Some("7"));
    }

    #[tokio::test]
    async fn test_sibling_parameters_bind_their_own_names() {
        let mut router = HttpRouter::new();
        router.get("/users/:id/posts", echo_param("id")).unwrap();
        router.get("/users/:uid", echo_param("uid")).unwrap();

        let response = router
            .dispatch(HttpRequest::new(Method::Get, "/users/5"), &NoopCapture)
            .await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "5");

        let response = router
            .dispatch(HttpRequest::new(Method::Get, "/users/6/posts"), &NoopCapture)
            .await;
        assert_eq!(response.body, "6");

        let found = router.find(Method::Get, "/users/5").unwrap();
        assert_eq!(found.pattern, "/users/:uid");
        assert_eq!(found.params.get("uid").map(String::as_str), Some("5"));
        assert!(!found.params.contains_key("id"));

        // root, "users", one shared parameter node, "posts"
        assert_eq!(router.node_count(), 4);
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn test_dispatch_future_is_send() {
        let mut router = HttpRouter::new();
        router.layer(|_req: &mut HttpRequest, _res: &mut HttpResponse| Flow::Continue);
        router.get("/", CountingHandler::new()).unwrap();
        assert_send(router.dispatch(HttpRequest::new(Method::Get, "/"), &NoopCapture));
    }

    #[tokio::test]
    async fn test_literal_wins_over_parameter() {
        let mut router = HttpRouter::new();
        router.get("/users/:id", echo_param("id")).unwrap();
        router
            .get("/users/me", |_request: HttpRequest| async move { "me" })
            .unwrap();

        let response = router
            .dispatch(HttpRequest::new(Method::Get, "/users/me"), &NoopCapture)
            .await;
        assert_eq!(response.body, "me");
    }

    #[tokio::test]
    async fn test_unmatched_paths_reach_fallthrough() {
        let mut router = HttpRouter::new();
        router.get("/users/:id", CountingHandler::new()).unwrap();

        for (method, path) in [
            (Method::Get, "/missing"),
            (Method::Get, "/users"),
            (Method::Get, "/users/1/posts"),
            (Method::Delete, "/users/1"),
        ] {
            let response = router
                .dispatch(HttpRequest::new(method, path), &NoopCapture)
                .await;
            assert_eq!(response.status_code, 404, "{method} {path}");
            assert_eq!(response.body, "Not Found");
        }
    }

    #[tokio::test]
    async fn test_custom_fallthrough() {
        let fallback = CountingHandler::new();
        let mut router = HttpRouter::new();
        router.fallthrough(fallback.clone());

        let mut request = HttpRequest::new(Method::Get, "/anything");
        request.http_method = "TRACE".into();
        let response = router.dispatch(request, &NoopCapture).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(fallback.count(), 1);
    }

    #[tokio::test]
    async fn test_reregistering_replaces_without_new_nodes() {
        let first = CountingHandler::new();
        let second = CountingHandler::new();
        let mut router = HttpRouter::new();
        router.get("/a/:b/c", first.clone()).unwrap();
        let nodes = router.node_count();

        router.get("/a/:b/c", second.clone()).unwrap();
        assert_eq!(router.node_count(), nodes);
        assert_eq!(router.len(), 1);

        router
            .dispatch(HttpRequest::new(Method::Get, "/a/x/c"), &NoopCapture)
            .await;
        assert_eq!(first.count(), 0);
        assert_eq!(second.count(), 1);
    }

    #[test]
    fn test_method_multiplexing_shares_node() {
        let mut router = HttpRouter::new();
        router.get("/items", CountingHandler::new()).unwrap();
        let nodes = router.node_count();
        router.post("/items", CountingHandler::new()).unwrap();

        assert_eq!(router.node_count(), nodes);
        assert_eq!(router.len(), 2);
        assert!(router.find(Method::Put, "/items").is_none());
    }

    #[test]
    fn test_path_must_start_with_slash() {
        let mut router = HttpRouter::new();
        let err = router
            .get("users", CountingHandler::new())
            .err()
            .unwrap();
        assert_eq!(err, RouteError::InvalidPath("users".into()));
        assert!(router.is_empty());
    }

    #[tokio::test]
    async fn test_head_falls_back_to_get_without_body() {
        let mut router = HttpRouter::new();
        router
            .get("/doc", |_request: HttpRequest| async move { "content" })
            .unwrap();

        let response = router
            .dispatch(HttpRequest::new(Method::Head, "/doc"), &NoopCapture)
            .await;
        assert_eq!(response.status_code, 200);
        assert!(response.body.is_empty());
        assert_eq!(response.content_type(), Some("text/plain; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_halting_middleware_short_circuits() {
        let handler = CountingHandler::new();
        let later = Arc::new(AtomicUsize::new(0));
        let later_seen = later.clone();

        let mut router = HttpRouter::new();
        router
            .route_with(
                Method::Get,
                "/admin",
                handler.clone(),
                vec![
                    Arc::new(|_req: &mut HttpRequest, _res: &mut HttpResponse| {
                        Flow::Halt(HttpResponse::text("Forbidden").with_status(403))
                    }),
                    Arc::new(move |_req: &mut HttpRequest, _res: &mut HttpResponse| {
                        later_seen.fetch_add(1, Ordering::SeqCst);
                        Flow::Continue
                    }),
                ],
            )
            .unwrap();

        let response = router
            .dispatch(HttpRequest::new(Method::Get, "/admin"), &NoopCapture)
            .await;
        assert_eq!(response.status_code, 403);
        assert_eq!(handler.count(), 0);
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_layer_runs_before_route_middleware_and_headers_merge() {
        let mut router = HttpRouter::new();
        router.layer(|_req: &mut HttpRequest, res: &mut HttpResponse| {
            res.set_header("X-Order", "layer");
            Flow::Continue
        });
        router
            .route_with(
                Method::Get,
                "/",
                |request: HttpRequest| async move {
                    request.header("x-seen").unwrap_or_default().to_string()
                },
                vec![Arc::new(|req: &mut HttpRequest, res: &mut HttpResponse| {
                    let before = res.header("x-order").unwrap_or_default().to_string();
                    req.headers.insert("X-Seen".into(), before);
                    res.set_header("X-Order", "route");
                    Flow::Continue
                })],
            )
            .unwrap();

        let response = router
            .dispatch(HttpRequest::new(Method::Get, "/"), &NoopCapture)
            .await;
        assert_eq!(response.body, "layer");
        assert_eq!(response.header("x-order"), Some("route"));
    }

    #[tokio::test]
    async fn test_handler_error_renders_in_draft_content_type() {
        let mut router = HttpRouter::new();
        router
            .route_with(
                Method::Get,
                "/api",
                FailingHandler::new("database unavailable"),
                vec![Arc::new(|_req: &mut HttpRequest, res: &mut HttpResponse| {
                    res.set_header("Content-Type", "application/json");
                    Flow::Continue
                })],
            )
            .unwrap();

        let response = router
            .dispatch(HttpRequest::new(Method::Get, "/api"), &NoopCapture)
            .await;
        assert_eq!(response.status_code, 500);
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["error"], "database unavailable");
    }

    #[tokio::test]
    async fn test_http_error_sets_status() {
        let mut router = HttpRouter::new();
        router
            .get("/teapot", |_request: HttpRequest| async move {
                Err::<HttpResponse, _>(HttpError::new(418, "short and stout"))
            })
            .unwrap();

        let response = router
            .dispatch(HttpRequest::new(Method::Get, "/teapot"), &NoopCapture)
            .await;
        assert_eq!(response.status_code, 418);
        assert_eq!(response.body, "short and stout");
    }

    #[tokio::test]
    async fn test_handler_runs_inside_capture() {
        let capture = RecordingCapture::new();
        let mut router = HttpRouter::new();
        router.get("/users/:id", CountingHandler::new()).unwrap();

        router
            .dispatch(HttpRequest::new(Method::Get, "/users/9"), &capture)
            .await;

        let segments = capture.segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].name, "GET /users/:id");
        assert_eq!(segments[0].annotation("path"), Some("/users/9"));
    }
}
