use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lifeline::classifier::majority_vote;
use lifeline::training::{train, Dataset, TrainingConfig};
use lifeline::ClassifierBundle;
use ndarray::Array2;

const DISEASES: usize = 12;
const SYMPTOMS: usize = 60;

/// Each disease owns a band of five symptoms; rows mix four of them with one stray symptom.
fn synthetic_dataset() -> Dataset {
    let rows_per_disease = 20;
    let n = DISEASES * rows_per_disease;
    let mut samples = Array2::zeros((n, SYMPTOMS));
    let mut labels = Vec::with_capacity(n);

    for d in 0..DISEASES {
        for r in 0..rows_per_disease {
            let row = d * rows_per_disease + r;
            for k in 0..5 {
                if k != r % 5 {
                    samples[[row, d * 5 + k]] = 1.0;
                }
            }
            samples[[row, (row * 7) % SYMPTOMS]] = 1.0;
            labels.push(format!("disease_{:02}", d));
        }
    }

    Dataset {
        symptoms: (0..SYMPTOMS).map(|s| format!("symptom_{:02}", s)).collect(),
        samples,
        labels,
    }
}

fn setup_benchmark_bundle() -> ClassifierBundle {
    let mut config = TrainingConfig::default();
    config.cv_folds = 0;
    train(&synthetic_dataset(), &config, "bench")
        .unwrap()
        .artifacts
        .into_bundle(Some("bench".into()))
        .unwrap()
}

fn bench_prediction(c: &mut Criterion) {
    let bundle = setup_benchmark_bundle();
    let mut group = c.benchmark_group("Prediction");

    // Configure sampling
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("two_symptoms", |b| {
        b.iter(|| bundle.predict(black_box(&["Symptom 00", "symptom_01"])).unwrap())
    });

    group.bench_function("five_symptoms", |b| {
        b.iter(|| {
            let report = ["symptom_10", "symptom_11", "symptom_12", "symptom_13", "symptom_14"];
            bundle.predict(black_box(&report)).unwrap()
        })
    });

    let noisy: Vec<String> = (0..40)
        .map(|i| if i % 2 == 0 { format!("symptom_{:02}", i) } else { format!("unknown_{}", i) })
        .collect();
    group.bench_function("noisy_report", |b| b.iter(|| bundle.predict(black_box(&noisy)).unwrap()));

    group.finish();
}

fn bench_voting(c: &mut Criterion) {
    let mut group = c.benchmark_group("Voting");
    group.bench_function("majority", |b| b.iter(|| majority_vote(black_box(&[7, 3, 7]))));
    group.bench_function("three_way_tie", |b| b.iter(|| majority_vote(black_box(&[9, 4, 6]))));
    group.finish();
}

criterion_group!(benches, bench_prediction, bench_voting);
criterion_main!(benches);
