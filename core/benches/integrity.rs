// benches/integrity.rs
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use offerbook_core::links::rebuild_backrefs;
use offerbook_core::{prune_to_consistency, Dataset, FilterPolicy, RawRows};

/// Synthetic snapshot: `n` applicants with three datapoints each, a shared
/// pool of programs and majors, and every tenth program missing its school
/// so the filter has cascades to chew on.
fn synthetic_snapshot(n: usize) -> Dataset {
    let mut applicants = RawRows::new();
    let mut datapoints = RawRows::new();
    let mut programs = RawRows::new();
    let mut majors = RawRows::new();

    let program_pool = n / 2 + 1;
    let major_pool = n / 10 + 1;

    for m in 0..major_pool {
        let members: Vec<String> = (0..n)
            .filter(|a| a % major_pool == m)
            .map(|a| format!("a{}", a))
            .collect();
        majors.insert(
            format!("m{}", m),
            json!({"ID": format!("M-{}", m), "Department": "Dept", "Major": "Major", "Applicants": members}),
        );
    }
    for p in 0..program_pool {
        let school = if p % 10 == 0 { "" } else { "School" };
        programs.insert(
            format!("p{}", p),
            json!({"ID": format!("P-{}", p), "School": school, "Program": "Program"}),
        );
    }
    for a in 0..n {
        applicants.insert(
            format!("a{}", a),
            json!({"ID": format!("A-{}", a), "Major": [format!("m{}", a % major_pool)], "GPA": 3.5}),
        );
        for i in 0..3 {
            let dp = a * 3 + i;
            datapoints.insert(
                format!("d{}", dp),
                json!({
                    "Applicants": [format!("a{}", a)],
                    "Program": [format!("p{}", dp % program_pool)],
                    "Year": 2020 + (dp % 5) as i32,
                    "Term": ["Spring", "Summer", "Fall", "Winter"][dp % 4],
                }),
            );
        }
    }

    Dataset::from_rows(&applicants, &datapoints, &programs, &majors)
}

fn bench_filter(c: &mut Criterion) {
    let mut base = synthetic_snapshot(500);
    rebuild_backrefs(&mut base);

    c.bench_function("integrity_filter_500", |b| {
        b.iter(|| {
            let mut ds = base.clone();
            let outcome = prune_to_consistency(&mut ds, &FilterPolicy::default())
                .expect("filter converges");
            black_box(outcome.passes)
        })
    });

    c.bench_function("rebuild_backrefs_500", |b| {
        b.iter(|| {
            let mut ds = base.clone();
            rebuild_backrefs(&mut ds);
            black_box(ds.reference_count())
        })
    });
}

criterion_group!(benches, bench_filter);
criterion_main!(benches);
