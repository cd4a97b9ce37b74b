use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rolepolicy_core::{GroupId, RequestContext, RoleKind};
use rolepolicy_directory::InMemoryDirectory;
use rolepolicy_lookup::{locator, GroupRoleManagementPolicyDataSource, LookupInput};
use tokio::runtime::Runtime;

const GROUP: &str = "55555555-5555-5555-5555-555555555555";

fn populated_directory(groups: usize) -> (InMemoryDirectory, GroupId) {
    let target = GroupId::parse(GROUP).unwrap();
    let mut directory = InMemoryDirectory::new().with_group_policy(&target, RoleKind::Owner, "policy-target");
    for i in 0..groups {
        let group = GroupId::parse(&format!("{i:08x}-0000-4000-8000-000000000000")).unwrap();
        directory = directory
            .with_group_policy(&group, RoleKind::Owner, format!("policy-{i}-owner").as_str())
            .with_group_policy(&group, RoleKind::Member, format!("policy-{i}-member").as_str());
    }
    (directory, target)
}

fn locator_benchmark(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let ctx = RequestContext::background();
    let mut group = c.benchmark_group("locator_resolve");

    for size in [10, 100, 1_000] {
        let (directory, target) = populated_directory(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                runtime.block_on(async {
                    black_box(
                        locator::resolve(&ctx, &directory, &target, RoleKind::Owner)
                            .await
                            .unwrap(),
                    )
                })
            })
        });
    }
    group.finish();
}

fn data_source_benchmark(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let ctx = RequestContext::background();
    let (directory, target) = populated_directory(100);
    let data_source = GroupRoleManagementPolicyDataSource::new().unwrap();
    let input = LookupInput::new(target, RoleKind::Owner);

    c.bench_function("data_source_read_suppressed", |b| {
        b.iter(|| {
            runtime.block_on(async {
                black_box(data_source.read(&ctx, &input, &directory).await.unwrap())
            })
        })
    });
}

criterion_group!(benches, locator_benchmark, data_source_benchmark);
criterion_main!(benches);
