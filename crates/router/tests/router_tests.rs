use async_trait::async_trait;
use futures::FutureExt;
use meta_router::{
    BoxError, Export, Flow, HandlerState, InvokeError, MiddlewareSpec, Module, ParamValue, Params, RequestHandler,
    RouteDescriptor, RouteError, RouteRequest, Router, RouterOptions, StepResult, async_loader_fn, handler_fn,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
struct TestRequest {
    method: &'static str,
    path: &'static str,
    params: Option<Params>,
    trail: Vec<&'static str>,
}

impl TestRequest {
    fn new(method: &'static str, path: &'static str) -> Self {
        Self { method, path, ..Self::default() }
    }
}

impl RouteRequest for TestRequest {
    fn route_path(&self) -> &str {
        self.path
    }

    fn route_method(&self) -> Option<&str> {
        Some(self.method)
    }

    fn attach_params(&mut self, params: &Params) {
        self.params = Some(params.clone());
    }
}

/// Terminal handler writing its name into the response
#[derive(Debug)]
struct Reply(&'static str);

#[async_trait]
impl RequestHandler<TestRequest, String> for Reply {
    async fn invoke(&self, req: &mut TestRequest, res: &mut String) -> StepResult {
        req.trail.push(self.0);
        res.push_str(self.0);
        Ok(Flow::Halt)
    }
}

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/routes.json")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A loader serving the fixture modules, counting loads per call
fn fixture_loader(calls: Arc<AtomicUsize>) -> impl meta_router::ModuleLoader<TestRequest, String> {
    async_loader_fn(move |id: String| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;

            let export: Export<TestRequest, String> = match id.as_str() {
                "./accounts" => Export::module(
                    Module::new().export("show", Export::handler(Reply("show"))).export("create", Export::handler(Reply("create"))),
                ),
                "./reports" => Export::module(Module::new().with_default(Export::handler(Reply("reports")))),
                "./docs" => Export::handler(Reply("docs")),
                "./fallback" => Export::handler(Reply("fallback")),
                other => return Err(BoxError::from(format!("cannot find module \"{other}\""))),
            };
            Ok(export)
        }
        .boxed()
    })
}

async fn configured_router(calls: &Arc<AtomicUsize>) -> Router<TestRequest, String> {
    init_tracing();
    let router = Router::new();
    router.configure_from_file(fixture(), fixture_loader(Arc::clone(calls))).await.unwrap();
    router
}

#[tokio::test]
async fn test_routes_from_file() {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = configured_router(&calls).await;

    let matched = router.find("/accounts/7", Some("GET")).unwrap().unwrap();
    assert_eq!(matched.params().get_str("id"), Some("7"));
    assert_eq!(matched.config().path(), "/accounts/:id");
    assert_eq!(matched.config().methods(), ["GET"]);

    let report = router.find("/reports/2024/q1/summary", Some("HEAD")).unwrap().unwrap();
    assert_eq!(report.params().get_str("year"), Some("2024"));
    assert_eq!(report.params().get("parts"), Some(&ParamValue::from(["q1", "summary"])));
    assert_eq!(report.config().methods(), ["GET", "HEAD"]);
    assert_eq!(report.config().get("auth"), Some(&Value::from("admin")));
    assert_eq!(report.config().get("cache"), Some(&json!({ "ttl": 60 })));
    assert_eq!(report.config().get("handler"), None);

    // the year must be numeric, the request falls through to the catch all route
    let fallback = router.find("/reports/latest", Some("GET")).unwrap().unwrap();
    assert_eq!(fallback.config().path(), "/");

    let docs = router.find("/Docs/guide", Some("GET")).unwrap().unwrap();
    assert_eq!(docs.path(), "/Docs");
    let lowercase = router.find("/docs/guide", Some("GET")).unwrap().unwrap();
    assert_eq!(lowercase.config().path(), "/");

    // nothing is loaded while matching
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_handle_runs_loaded_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = configured_router(&calls).await;

    let mut req = TestRequest::new("POST", "/accounts");
    let mut res = String::new();
    assert_eq!(router.handle(&mut req, &mut res).await.unwrap(), Some(Flow::Halt));
    assert_eq!(res, "create");
    assert_eq!(req.params, Some(Params::empty()));

    let mut req = TestRequest::new("GET", "/accounts/12");
    let mut res = String::new();
    router.handle(&mut req, &mut res).await.unwrap();
    assert_eq!(res, "show");
    assert_eq!(req.params.as_ref().and_then(|params| params.get_str("id")), Some("12"));

    // both routes share the module id but each route loads once
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_first_use_loads_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = configured_router(&calls).await;
    let matched = router.find("/accounts/1", Some("GET")).unwrap().unwrap();
    assert_eq!(matched.route().handler_state(), HandlerState::Unresolved);

    let runs = (0..16).map(|_| {
        let router = &router;
        let matched = &matched;
        async move {
            let mut req = TestRequest::new("GET", "/accounts/1");
            let mut res = String::new();
            router.invoke(matched, &mut req, &mut res).await.map(|_| res)
        }
    });
    let results = futures::future::join_all(runs).await;

    assert!(results.iter().all(|res| matches!(res, Ok(body) if body == "show")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(matched.route().handler_state(), HandlerState::Resolved);
}

#[tokio::test]
async fn test_failed_load_is_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = configured_router(&calls).await;

    let mut errors = vec![];
    for _ in 0..3 {
        let err = router.handle(&mut TestRequest::new("GET", "/broken"), &mut String::new()).await.unwrap_err();
        errors.push(err.as_unresolved().map(Arc::clone).unwrap());
    }

    assert!(errors.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert!(matches!(&*errors[0], RouteError::LoaderFailure { module, .. } if module == "./broken"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // preloading reports the cached failure
    assert!(matches!(router.preload().await, Err(InvokeError::Unresolved(_))));
}

#[tokio::test]
async fn test_unknown_method_falls_through() {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = configured_router(&calls).await;

    let matched = router.find("/accounts/1", Some("DELETE")).unwrap().unwrap();
    assert_eq!(matched.config().methods(), ["*"]);
    assert_eq!(matched.config().path(), "/");
}

#[tokio::test]
async fn test_bad_routes_file() {
    init_tracing();
    let router: Router<TestRequest, String> = Router::new();
    let err = router.configure_from_file("tests/fixtures/missing.json", meta_router::NoopLoader).await.unwrap_err();
    assert!(matches!(err, RouteError::RoutesFile { .. }));
    assert!(!router.is_configured());
}

#[tokio::test]
async fn test_middleware_errors_reach_the_caller() {
    init_tracing();
    let guard = handler_fn(|req: &mut TestRequest, _res: &mut String| {
        async move {
            req.trail.push("guard");
            if req.path.ends_with("/secret") { Err(BoxError::from("forbidden")) } else { Ok(Flow::Continue) }
        }
        .boxed()
    });

    let router = Router::new();
    router
        .configure(RouterOptions::new([RouteDescriptor::new("GET /files/:name")
            .middleware(MiddlewareSpec::direct(guard))
            .handler(Arc::new(Reply("file")) as meta_router::SharedHandler<TestRequest, String>)]))
        .unwrap();

    let mut req = TestRequest::new("GET", "/files/secret");
    let err = router.handle(&mut req, &mut String::new()).await.unwrap_err();
    assert!(matches!(&err, InvokeError::Step(e) if e.to_string() == "forbidden"));
    assert_eq!(req.trail, vec!["guard"]);

    let mut req = TestRequest::new("GET", "/files/public");
    let mut res = String::new();
    router.handle(&mut req, &mut res).await.unwrap();
    assert_eq!(req.trail, vec!["guard", "file"]);
    assert_eq!(res, "file");

    let mut req = TestRequest::new("GET", "/other");
    assert_eq!(router.handle(&mut req, &mut String::new()).await.unwrap(), None);
}
