fn main() {
    if let Err(e) = run() {
        eprintln!("benchmark failed: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    use anyhow::{bail, Context};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use serde::Serialize;
    use std::path::{Path, PathBuf};
    use std::time::Instant;
    use verba_core::{EngineConfig, TranscriptPair, VerbaEngine};

    #[derive(Debug)]
    struct Args {
        fixtures_dir: Option<PathBuf>,
        synthetic_files: usize,
        iterations: usize,
        workers: usize,
        seed: u64,
        output: Option<PathBuf>,
    }

    #[derive(Debug, Clone, Serialize)]
    struct IterationResult {
        iteration: usize,
        latency_ms: f64,
        words_per_second: f64,
    }

    #[derive(Debug, Clone, Serialize)]
    struct Summary {
        source: String,
        iterations: usize,
        workers: usize,
        total_files: usize,
        reference_words: u64,
        stats_rows: usize,
        word_error_rows: usize,
        error_records: usize,
        corpus_wer: f64,
        p50_latency_ms: f64,
        p95_latency_ms: f64,
        avg_latency_ms: f64,
        runs: Vec<IterationResult>,
    }

    fn parse_args() -> anyhow::Result<Args> {
        let mut args = Args {
            fixtures_dir: None,
            synthetic_files: 200,
            iterations: 3,
            workers: 0,
            seed: 7,
            output: None,
        };

        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            let mut value = |name: &str| {
                it.next()
                    .with_context(|| format!("missing value for {name}"))
            };
            match arg.as_str() {
                "--fixtures" => args.fixtures_dir = Some(PathBuf::from(value("--fixtures")?)),
                "--synthetic" => {
                    args.synthetic_files = value("--synthetic")?
                        .parse::<usize>()
                        .context("invalid value for --synthetic")?
                        .clamp(1, 100_000);
                }
                "--iterations" => {
                    args.iterations = value("--iterations")?
                        .parse::<usize>()
                        .context("invalid value for --iterations")?
                        .clamp(1, 50);
                }
                "--workers" => {
                    args.workers = value("--workers")?
                        .parse::<usize>()
                        .context("invalid value for --workers")?;
                }
                "--seed" => {
                    args.seed = value("--seed")?
                        .parse::<u64>()
                        .context("invalid value for --seed")?;
                }
                "--output" => args.output = Some(PathBuf::from(value("--output")?)),
                "--help" | "-h" => {
                    println!(
                        "Usage: cargo run -p verba-core --release --bin benchmark -- \\
  [--fixtures <dir with reference/ and hypothesis/>] [--synthetic <files>] \\
  [--iterations <n>] [--workers <n>] [--seed <n>] [--output <file.json>]"
                    );
                    std::process::exit(0);
                }
                other => bail!("unknown argument: {other}"),
            }
        }
        Ok(args)
    }

    fn collect_txt(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
        let entries =
            std::fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                collect_txt(&path, out)?;
            } else if path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.eq_ignore_ascii_case("txt"))
            {
                out.push(path);
            }
        }
        Ok(())
    }

    fn load_fixtures(dir: &Path) -> anyhow::Result<Vec<TranscriptPair>> {
        let reference_dir = dir.join("reference");
        let hypothesis_dir = dir.join("hypothesis");
        let mut files = Vec::new();
        collect_txt(&reference_dir, &mut files)?;
        files.sort();

        let mut pairs = Vec::with_capacity(files.len());
        for path in files {
            let rel = path.strip_prefix(&reference_dir)?.to_path_buf();
            let reference = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let hypothesis = std::fs::read_to_string(hypothesis_dir.join(&rel)).ok();
            pairs.push(TranscriptPair {
                file_id: rel.display().to_string(),
                reference: Some(reference),
                hypothesis,
            });
        }
        Ok(pairs)
    }

    const VOCAB: &[&str] = &[
        "the", "a", "call", "account", "balance", "payment", "card", "number", "please",
        "thank", "you", "hello", "yes", "no", "okay", "morning", "afternoon", "transfer",
        "bank", "branch", "help", "today", "name", "address", "phone", "email", "password",
        "reset", "statement", "loan", "interest", "rate", "month", "year", "could", "would",
        "check", "confirm", "details", "moment", "hold", "line", "sorry", "again", "repeat",
    ];

    fn synthetic_corpus(files: usize, seed: u64) -> Vec<TranscriptPair> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pairs = Vec::with_capacity(files);
        for f in 0..files {
            let mut reference = String::new();
            let mut hypothesis = String::new();
            let mut t = 0.0f64;
            for _ in 0..rng.gen_range(10..40) {
                let tag = ["L", "R"][rng.gen_range(0..2)];
                let len = rng.gen_range(3..15);
                let words: Vec<&str> = (0..len)
                    .filter_map(|_| VOCAB.choose(&mut rng).copied())
                    .collect();
                let mut noisy = Vec::with_capacity(words.len() + 2);
                for &w in &words {
                    match rng.gen_range(0..100) {
                        0..=5 => {}
                        6..=13 => noisy.extend(VOCAB.choose(&mut rng).copied()),
                        14..=17 => {
                            noisy.push(w);
                            noisy.extend(VOCAB.choose(&mut rng).copied());
                        }
                        _ => noisy.push(w),
                    }
                }
                let end = t + rng.gen_range(0.5..4.0);
                reference.push_str(&format!("{tag} {t:.2} {end:.2} {}\n", words.join(" ")));
                hypothesis.push_str(&format!("{tag} {t:.2} {end:.2} {}\n", noisy.join(" ")));
                t = end;
            }
            pairs.push(TranscriptPair::new(
                format!("synthetic/{f:05}.txt"),
                reference,
                hypothesis,
            ));
        }
        pairs
    }

    fn percentile(values: &[f64], p: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let idx = ((sorted.len() - 1) as f64 * p.clamp(0.0, 1.0)).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    let args = parse_args()?;
    let (source, pairs) = match &args.fixtures_dir {
        Some(dir) => {
            if !dir.exists() {
                bail!("fixtures directory not found: {}", dir.display());
            }
            (dir.display().to_string(), load_fixtures(dir)?)
        }
        None => (
            format!("synthetic(files={}, seed={})", args.synthetic_files, args.seed),
            synthetic_corpus(args.synthetic_files, args.seed),
        ),
    };
    if pairs.is_empty() {
        bail!("no transcript pairs to benchmark");
    }

    let engine = VerbaEngine::new(EngineConfig {
        workers: args.workers,
        ..EngineConfig::default()
    })
    .context("invalid engine configuration")?;
    let workers = engine.config().effective_workers();

    println!(
        "Running Verba benchmark on {} pairs (iterations={}, workers={})",
        pairs.len(),
        args.iterations,
        workers
    );

    let mut runs = Vec::new();
    let mut last = None;
    for iteration in 1..=args.iterations {
        let started = Instant::now();
        let report = engine.evaluate(pairs.clone())?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        let words = report.totals().reference_len();
        runs.push(IterationResult {
            iteration,
            latency_ms,
            words_per_second: if latency_ms > 0.0 {
                words as f64 / (latency_ms / 1000.0)
            } else {
                0.0
            },
        });
        println!(
            "[{iteration}/{iters}] {latency_ms:.1} ms",
            iters = args.iterations
        );
        last = Some(report);
    }

    let report = last.unwrap_or_default();
    let totals = report.totals();
    let latencies = runs.iter().map(|r| r.latency_ms).collect::<Vec<_>>();
    let summary = Summary {
        source,
        iterations: args.iterations,
        workers,
        total_files: pairs.len(),
        reference_words: totals.reference_len(),
        stats_rows: report.stats.len(),
        word_error_rows: report.word_errors.len(),
        error_records: report.errors.len(),
        corpus_wer: totals.wer(),
        p50_latency_ms: percentile(&latencies, 0.50),
        p95_latency_ms: percentile(&latencies, 0.95),
        avg_latency_ms: latencies.iter().sum::<f64>() / latencies.len().max(1) as f64,
        runs,
    };

    println!(
        "Done. files={} p50={:.1}ms p95={:.1}ms wer={:.2}%",
        summary.total_files,
        summary.p50_latency_ms,
        summary.p95_latency_ms,
        summary.corpus_wer * 100.0
    );

    let json = serde_json::to_string_pretty(&summary)?;
    if let Some(out) = args.output {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&out, json)
            .with_context(|| format!("failed to write {}", out.display()))?;
        println!("Wrote benchmark report: {}", out.display());
    } else {
        println!("{json}");
    }

    Ok(())
}
