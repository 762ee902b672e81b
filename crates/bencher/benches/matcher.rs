use bencher::{Probe, RouteTable, TestCase};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meta_router::{
    routes_file, Flow, Matcher, MiddlewareSpec, NoopLoader, RequestHandler, RouteDescriptor, SharedHandler, SharedLoader,
    StepResult,
};
use std::hint::black_box;
use std::sync::Arc;

static SMALL_TABLE: RouteTable = RouteTable::new("small.json", include_str!("../resources/routes/small.json"));
static LARGE_TABLE: RouteTable = RouteTable::new("large.json", include_str!("../resources/routes/large.json"));

static SMALL_PROBES: &[Probe] = &[
    Probe::new("GET", "/health"),
    Probe::new("POST", "/users"),
    Probe::new("DELETE", "/users/42"),
    Probe::new("GET", "/unknown/path"),
];

static LARGE_PROBES: &[Probe] = &[
    Probe::new("GET", "/api/v1/users"),
    Probe::new("PATCH", "/api/v1/milestones/1024"),
    Probe::new("GET", "/api/v1/artifacts/7/files/build/output/app%20v1.tar.gz"),
    Probe::new("GET", "/static/css/site.css"),
    Probe::any("/api/v1/jobs/not-a-number"),
    Probe::new("OPTIONS", "/api/v1/pipelines"),
];

fn create_test_cases() -> Vec<TestCase> {
    vec![TestCase::small("small_table", SMALL_TABLE, SMALL_PROBES), TestCase::large("large_table", LARGE_TABLE, LARGE_PROBES)]
}

fn build_matcher(table: &RouteTable) -> Matcher<(), ()> {
    let descriptors = routes_file::parse(table.content()).expect("route table should be valid");
    Matcher::build(descriptors).expect("route table should compile")
}

fn benchmark_match_route(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("match_route");

    for case in create_test_cases() {
        let matcher = build_matcher(case.table());
        group.throughput(Throughput::Elements(case.probes().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter(|| {
                for probe in case.probes() {
                    let matched = matcher.match_route(probe.path, probe.method).expect("probe path should decode");
                    black_box(matched);
                }
            });
        });
    }

    group.finish();
}

fn benchmark_build_matcher(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("build_matcher");

    for case in create_test_cases() {
        group.bench_with_input(BenchmarkId::from_parameter(case.table().file_name()), &case, |b, case| {
            b.iter(|| black_box(build_matcher(case.table())));
        });
    }

    group.finish();
}

#[derive(Debug)]
struct Count;

#[async_trait::async_trait]
impl RequestHandler<usize, ()> for Count {
    async fn invoke(&self, req: &mut usize, _res: &mut ()) -> StepResult {
        *req += 1;
        Ok(Flow::Continue)
    }
}

fn benchmark_invoke_chain(criterion: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime should start");
    let mut group = criterion.benchmark_group("invoke_chain");
    let loader: SharedLoader<usize, ()> = Arc::new(NoopLoader);

    for depth in [1usize, 4, 16] {
        let mut descriptor = RouteDescriptor::new("GET /users/:id").handler(Arc::new(Count) as SharedHandler<usize, ()>);
        for _ in 1..depth {
            descriptor = descriptor.middleware(MiddlewareSpec::direct(Count));
        }
        let matcher = Matcher::build([descriptor]).expect("route should compile");
        let matched = matcher.match_route("/users/1", Some("GET")).expect("path should decode").expect("route should match");

        group.bench_with_input(BenchmarkId::from_parameter(depth), &matched, |b, matched| {
            b.iter(|| {
                runtime.block_on(async {
                    let mut count = 0usize;
                    matched.invoke(&loader, &mut count, &mut ()).await.expect("chain should succeed");
                    black_box(count)
                })
            });
        });
    }

    group.finish();
}

criterion_group!(matcher, benchmark_match_route, benchmark_build_matcher, benchmark_invoke_chain);
criterion_main!(matcher);
