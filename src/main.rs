use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use tricount::io::{load_graph, InputFormat, ReadOptions};
use tricount::{count_triangles_cpu, MultiplyStrategy, PipelineConfig, TrianglePipeline};

#[derive(Parser)]
#[command(name = "tricount", version, about = "Count triangles of an undirected graph in CSR form")]
struct Cli {
    /// Graph file: edge list, dense CSV or Matrix Market
    path: PathBuf,

    /// Input format
    #[arg(long, value_enum, default_value = "auto")]
    format: FormatArg,

    /// Vertex ids in the edge list start at 1
    #[arg(long)]
    one_based: bool,

    /// Number of vertices (default: largest id + 1)
    #[arg(long)]
    vertices: Option<usize>,

    /// Device worker threads (default: all cores)
    #[arg(long, env = "TRICOUNT_THREADS")]
    threads: Option<usize>,

    /// Rows per kernel block
    #[arg(long, default_value_t = 256)]
    block_size: usize,

    /// Coordinates kept by the sparse multiply
    #[arg(long, value_enum, default_value = "masked")]
    strategy: StrategyArg,

    /// Device memory limit in bytes
    #[arg(long, env = "TRICOUNT_MEMORY_LIMIT")]
    memory_limit: Option<usize>,

    /// Skip the CPU reference count
    #[arg(long)]
    skip_reference: bool,

    /// Run the device pipeline this many times
    #[arg(long, default_value_t = 1)]
    repeat: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Auto,
    Edges,
    Dense,
    Mtx,
}

impl From<FormatArg> for InputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => InputFormat::Auto,
            FormatArg::Edges => InputFormat::EdgeList,
            FormatArg::Dense => InputFormat::Dense,
            FormatArg::Mtx => InputFormat::MatrixMarket,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Masked,
    Candidates,
}

impl From<StrategyArg> for MultiplyStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Masked => MultiplyStrategy::Masked,
            StrategyArg::Candidates => MultiplyStrategy::Candidates,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let options = ReadOptions {
        one_based: cli.one_based,
        n_vertices: cli.vertices,
    };
    let start = Instant::now();
    let graph = load_graph(&cli.path, cli.format.into(), &options)
        .with_context(|| format!("failed to load {}", cli.path.display()))?;
    let load_time = start.elapsed();

    let mut config = match cli.threads {
        Some(threads) => PipelineConfig::with_threads(threads),
        None => PipelineConfig::default(),
    };
    config.block_size = cli.block_size;
    config.strategy = cli.strategy.into();
    config.memory_limit = cli.memory_limit;

    let pipeline = TrianglePipeline::new(config)?;

    let mut triangles = None;
    for run in 0..cli.repeat.max(1) {
        let report = pipeline.run(&graph.adjacency)?;
        info!(
            run,
            triangles = report.triangles,
            elapsed = ?report.timings.total(),
            "device pipeline finished"
        );

        if let Some(previous) = triangles {
            if previous != report.triangles {
                bail!("run {} counted {} triangles, earlier runs {}", run, report.triangles, previous);
            }
        } else {
            println!("Triangles (device):    {}", report.triangles);
            println!(
                "Filter:                {} of {} wedges closed (accept rate {:.4})",
                report.filter.accepted,
                report.filter.examined,
                report.filter.accept_rate()
            );
            println!("Candidate nnz:         {}", report.candidate_nnz);
            println!("Contributing rows:     {}", report.contributing_rows);
            println!("Load time:             {:?}", load_time);
            println!("Upload time:           {:?}", report.timings.upload);
            println!("Multiply time:         {:?}", report.timings.multiply);
            println!("Filter time:           {:?}", report.timings.filter);
            println!("Count time:            {:?}", report.timings.count);
            println!("Reduce time:           {:?}", report.timings.reduce);
        }
        triangles = Some(report.triangles);
    }
    let triangles = triangles.unwrap_or_default();

    if !cli.skip_reference {
        let start = Instant::now();
        let reference = count_triangles_cpu(&graph.adjacency, None);
        println!("Triangles (CPU):       {}", reference);
        println!("CPU time:              {:?}", start.elapsed());
        if reference != triangles {
            bail!("device counted {} triangles, CPU reference {}", triangles, reference);
        }
    }

    if let Some(expected) = graph.expected_triangles {
        println!("Triangles (declared):  {}", expected);
        if expected != triangles {
            warn!(expected, counted = triangles, "declared triangle count differs");
            bail!("file declares {} triangles, counted {}", expected, triangles);
        }
    }

    Ok(())
}
