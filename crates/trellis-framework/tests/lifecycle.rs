//! End-to-end request lifecycle through `Application`.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use serde_json::{Value, json};
use tower::ServiceExt;
use trellis_core::{BoxError, ServiceManager};
use trellis_framework::controller::Params;
use trellis_framework::listener::RouteListener;
use trellis_framework::prelude::*;
use trellis_framework::{
    DispatchState, ErrorKind, ErrorReason, InjectionError, ParamType, ScalarKind,
    ViewManagerOptions,
};

// ─── Controllers ───

#[derive(Injectable)]
struct BarController;

impl Dispatchable for BarController {
    fn dispatch(&mut self, _: &Request, _: &mut Response) -> Result<ActionResult, BoxError> {
        Ok(json!({ "bar": true }).into())
    }
}

trait SampleInterface: Send + Sync {
    fn sample(&self) -> &'static str;
}

struct Sample;

impl SampleInterface for Sample {
    fn sample(&self) -> &'static str {
        "sampled"
    }
}

#[derive(Injectable)]
struct SampleController {
    sample: Arc<dyn SampleInterface>,
    config: Option<Arc<Value>>,
    #[inject(default = 20)]
    page_size: i64,
    title: Option<String>,
    #[inject(skip)]
    context: Option<ControllerContext>,
}

impl Dispatchable for SampleController {
    fn dispatch(&mut self, _: &Request, _: &mut Response) -> Result<ActionResult, BoxError> {
        let id = self
            .context
            .as_ref()
            .and_then(|ctx| Params.from_route(ctx, "id"));
        Ok(json!({
            "sample": self.sample.sample(),
            "db": self.config.as_ref().map(|c| c["db"].clone()),
            "page_size": self.page_size,
            "title": self.title,
            "id": id,
        })
        .into())
    }

    fn as_context_aware(&mut self) -> Option<&mut dyn ContextAware> {
        Some(self)
    }
}

impl ContextAware for SampleController {
    fn set_context(&mut self, context: ControllerContext) {
        self.context = Some(context);
    }
}

trait Notifier: Send + Sync {}

struct Quiet;

impl Notifier for Quiet {}

#[derive(Injectable)]
struct NotifyController {
    #[inject(union = ["Mailer", "SmsGateway"])]
    _notifier: Arc<dyn Notifier>,
}

impl Dispatchable for NotifyController {
    fn dispatch(&mut self, _: &Request, _: &mut Response) -> Result<ActionResult, BoxError> {
        Ok(json!({ "notified": true }).into())
    }
}

// ─── Helpers ───

fn routes() -> RouteStack {
    RouteStack::from_config(&[
        RouteConfig::literal("bar", "/bar").default_param("controller", "Bar"),
        RouteConfig::segment("sample", "/sample[/:id]")
            .constraint("id", "[0-9]+")
            .default_param("controller", "Sample"),
        RouteConfig::literal("ghost", "/ghost").default_param("controller", "Ghost"),
    ])
    .unwrap()
}

fn controllers() -> ControllerManager {
    ControllerManager::new()
        .controller::<BarController>("Bar")
        .controller::<SampleController>("Sample")
        .controller::<NotifyController>("Notify")
}

fn request(path: &str) -> Request {
    http::Request::builder().uri(path).body(Bytes::new()).unwrap()
}

fn body_json(response: &Response) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

// ─── Tests ───

#[test]
fn test_derived_parameters() {
    let params = <SampleController as trellis_framework::Injectable>::parameters();
    let names: Vec<_> = params.iter().map(|p| p.name()).collect();
    assert_eq!(names, ["sample", "config", "page_size", "title"]);

    assert_eq!(params[0].ty(), &ParamType::Service("SampleInterface".into()));
    assert!(!params[0].has_default());
    assert_eq!(params[1].ty(), &ParamType::Structured);
    assert_eq!(params[2].ty(), &ParamType::Scalar(ScalarKind::Integer));
    assert!(params[2].has_default());
    assert_eq!(params[3].ty(), &ParamType::Scalar(ScalarKind::String));
    assert!(<BarController as trellis_framework::Injectable>::parameters().is_empty());
}

#[test]
fn test_union_field_is_ambiguous() {
    let params = <NotifyController as trellis_framework::Injectable>::parameters();
    assert_eq!(
        params[0].ty(),
        &ParamType::Union(vec!["Mailer".into(), "SmsGateway".into()])
    );

    let notifier: Arc<dyn Notifier> = Arc::new(Quiet);
    let services = ServiceManager::builder()
        .service("Mailer", Arc::clone(&notifier))
        .service("SmsGateway", notifier)
        .build();
    let Err(err) = controllers().create(&services, "Notify") else {
        panic!("expected an ambiguous parameter");
    };
    match err {
        InjectionError::AmbiguousType {
            handler,
            parameter,
            candidates,
        } => {
            assert_eq!(handler, "NotifyController");
            assert_eq!(parameter, "_notifier");
            assert_eq!(candidates, ["Mailer", "SmsGateway"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_zero_parameter_controller_completes() {
    let app = Application::builder()
        .router(routes())
        .controllers(controllers())
        .build()
        .unwrap();

    let report = app.handle(request("/bar")).unwrap();
    assert_eq!(
        report.transitions(),
        [
            DispatchState::Idle,
            DispatchState::Routing,
            DispatchState::Dispatching,
            DispatchState::Completed,
            DispatchState::Finished,
        ]
    );
    assert_eq!(
        report.result().and_then(ActionResult::as_value),
        Some(&json!({ "bar": true }))
    );
    assert_eq!(body_json(report.context().response()), json!({ "bar": true }));
}

#[test]
fn test_missing_route_without_error_listener() {
    let app = Application::builder()
        .router(routes())
        .controllers(controllers())
        .without_default_listeners()
        .aggregate(RouteListener)
        .build()
        .unwrap();

    let report = app.handle(request("/nowhere")).unwrap();
    assert_eq!(report.outcome(), DispatchState::Error(ErrorKind::NotFound));
    assert!(report.result().is_none());
    assert!(matches!(report.context().error(), Some(ErrorReason::NotFound)));
}

#[test]
fn test_unregistered_controller_is_not_found() {
    let app = Application::builder()
        .router(routes())
        .controllers(controllers())
        .view_manager(ViewManagerOptions {
            display_not_found_reason: true,
            display_exceptions: false,
        })
        .build()
        .unwrap();

    let report = app.handle(request("/ghost")).unwrap();
    assert_eq!(
        report.outcome(),
        DispatchState::Error(ErrorKind::ControllerNotFound)
    );
    let response = report.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(&response)["controller"], "Ghost");
}

#[test]
fn test_unresolvable_dependency_fails_construction() {
    let app = Application::builder()
        .router(routes())
        .controllers(controllers())
        .view_manager(ViewManagerOptions {
            display_not_found_reason: false,
            display_exceptions: true,
        })
        .build()
        .unwrap();

    let report = app.handle(request("/sample")).unwrap();
    assert_eq!(
        report.outcome(),
        DispatchState::Error(ErrorKind::ConstructionFailed)
    );
    match report.context().error() {
        Some(ErrorReason::ConstructionFailed(InjectionError::UnresolvedService {
            parameter,
            type_name,
            ..
        })) => {
            assert_eq!(parameter, "sample");
            assert_eq!(type_name, "SampleInterface");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        report.context().response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_injected_controller_with_route_params() {
    let sample: Arc<dyn SampleInterface> = Arc::new(Sample);
    let services = ServiceManager::builder()
        .service("SampleInterface", sample)
        .service("config", Arc::new(json!({ "db": "sqlite" })))
        .build();
    let app = Application::builder()
        .services(services)
        .router(routes())
        .controllers(controllers())
        .build()
        .unwrap();

    let response = app.run(request("/sample/42")).unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(&response),
        json!({
            "sample": "sampled",
            "db": "sqlite",
            "page_size": 20,
            "title": null,
            "id": "42",
        })
    );
}

#[test]
fn test_tower_oneshot() {
    let app = Application::builder()
        .router(routes())
        .controllers(controllers())
        .build()
        .unwrap();

    let response = tokio_test::block_on(app.oneshot(request("/bar"))).unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
