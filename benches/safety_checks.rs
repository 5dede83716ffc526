use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use safegit::config::GitOpsConfig;
use safegit::git::{mark_binary_files, truncate_lines};
use safegit::security::policy::rewrite_force_flags;
use safegit::security::{
    BranchName, PolicyAction, PolicyEngine, validate_branch_name, validate_file_path,
    validate_log_filter, validate_ref,
};

const BRANCH_NAMES: &[&str] = &[
    "main",
    "feature/login-form",
    "release-v1.2.3",
    "user_name/fix.bug",
    "-rf",
    "main..evil",
    "has space",
];

const REFS: &[&str] = &["HEAD", "HEAD^", "origin/main", "abc1234", "main;rm", "$(id)"];

fn generate_diff(num_files: usize, binary_every: usize) -> String {
    let mut output = String::new();
    for i in 0..num_files {
        output.push_str(&format!("diff --git a/file_{i}.rs b/file_{i}.rs\n"));
        if binary_every > 0 && i % binary_every == 0 {
            output.push_str(&format!("Binary files a/file_{i}.rs and b/file_{i}.rs differ\n"));
        } else {
            output.push_str("@@ -1,3 +1,3 @@\n-old line\n+new line\n context\n");
        }
    }
    output
}

fn generate_log(num_commits: usize) -> String {
    (0..num_commits)
        .map(|i| format!("{:07x} Commit message {}\n", i, i))
        .collect()
}

fn bench_validators(c: &mut Criterion) {
    let mut group = c.benchmark_group("validators");

    group.bench_function("branch_names", |b| {
        b.iter(|| {
            for name in BRANCH_NAMES {
                let _ = validate_branch_name(black_box(name));
            }
        })
    });

    group.bench_function("refs", |b| {
        b.iter(|| {
            for r in REFS {
                let _ = validate_ref(black_box(r));
            }
        })
    });

    group.bench_function("file_path", |b| {
        b.iter(|| validate_file_path(black_box("src/deeply/nested/module/file name.rs")))
    });

    group.bench_function("log_filter", |b| {
        b.iter(|| validate_log_filter(black_box("Jane Doe <jane@example.com>"), "author"))
    });

    group.finish();
}

fn bench_policy(c: &mut Criterion) {
    let config = GitOpsConfig {
        allow_force_push: true,
        ..GitOpsConfig::default()
    };
    let engine = PolicyEngine::new(&config);
    let branch = BranchName::parse("feature-x").unwrap();
    let args: Vec<String> = ["--set-upstream", "--force", "origin", "feature-x"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    c.bench_function("policy_force_push", |b| {
        b.iter(|| {
            engine.evaluate(black_box(&PolicyAction::Push {
                branch: &branch,
                force: true,
                args: &args,
            }))
        })
    });

    c.bench_function("rewrite_force_flags", |b| {
        b.iter(|| rewrite_force_flags(black_box(&args)))
    });
}

fn bench_output_governor(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncate_lines");
    for size in [100, 1_000, 10_000] {
        let log = generate_log(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &log, |b, log| {
            b.iter(|| truncate_lines(black_box(log), 200, "log"))
        });
    }
    group.finish();

    let mut group = c.benchmark_group("mark_binary_files");
    for size in [10, 100, 1_000] {
        let diff = generate_diff(size, 5);
        group.bench_with_input(BenchmarkId::from_parameter(size), &diff, |b, diff| {
            b.iter(|| mark_binary_files(black_box(diff)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_validators, bench_policy, bench_output_governor);
criterion_main!(benches);
