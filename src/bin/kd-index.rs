use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;

use kd_index::csv::{read_points, write_answers};
use kd_index::kdtree::{KDTree, KDTreeIndex};

/// Build k-d trees over sample points and answer nearest-point queries against them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a tree over the sample points and save it
    Build {
        /// CSV file with one sample point per row
        samples: PathBuf,
        /// Where to write the tree
        #[arg(default_value = "tree.kdt")]
        output: PathBuf,
    },
    /// Answer the nearest sample point for every query point
    Query {
        /// A tree written by `build`
        tree: PathBuf,
        /// The sample points the tree was built from
        samples: PathBuf,
        /// CSV file with one query point per row
        queries: PathBuf,
        /// Where to write the answers
        #[arg(default_value = "answers.csv")]
        answers: PathBuf,
    },
}

fn build(samples: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let points = read_points(&samples)
        .with_context(|| format!("reading sample points from {}", samples.display()))?;
    info!("read {} sample points", points.len());

    let start = Instant::now();
    let tree = KDTree::build(&points).context("building tree")?;
    info!(
        "built tree of depth {} in {:.3}s",
        tree.depth(),
        start.elapsed().as_secs_f64()
    );

    tree.save(&output)
        .with_context(|| format!("writing tree to {}", output.display()))?;
    info!("wrote {}", output.display());
    Ok(())
}

fn query(
    tree_path: PathBuf,
    samples: PathBuf,
    queries: PathBuf,
    answers: PathBuf,
) -> anyhow::Result<()> {
    let tree = KDTree::<f64>::load(&tree_path)
        .with_context(|| format!("loading tree from {}", tree_path.display()))?;
    let points = read_points(&samples)
        .with_context(|| format!("reading sample points from {}", samples.display()))?;
    if points.len() < tree.num_items() as usize {
        bail!(
            "{} holds {} points but the tree indexes {}",
            samples.display(),
            points.len(),
            tree.num_items()
        );
    }
    let queries_points = read_points(&queries)
        .with_context(|| format!("reading query points from {}", queries.display()))?;
    info!("answering {} queries", queries_points.len());

    let start = Instant::now();
    let neighbors = tree
        .nearest_batch(&points, &queries_points)
        .context("searching tree")?;
    info!(
        "answered {} queries in {:.3}s",
        neighbors.len(),
        start.elapsed().as_secs_f64()
    );

    write_answers(&answers, &neighbors, &points)
        .with_context(|| format!("writing answers to {}", answers.display()))?;
    info!("wrote {}", answers.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Build { samples, output } => build(samples, output),
        Command::Query {
            tree,
            samples,
            queries,
            answers,
        } => query(tree, samples, queries, answers),
    }
}
