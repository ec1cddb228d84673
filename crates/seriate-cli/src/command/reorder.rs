use std::path::PathBuf;

use anyhow::Context;
use seriate_cluster::{
    distance::Metric,
    linkage::LinkageMethod,
    reorder::{ReorderInput, ReorderOptions},
};

use crate::{
    schema::{
        matrix::MatrixJson,
        output::{MergeJson, ReorderResult},
    },
    util::{self, Output},
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
enum InputKind {
    /// Guess from the shape and content of the matrix
    #[default]
    Auto,
    /// One item per row
    Features,
    /// Square distance matrix
    Square,
    /// Single row of condensed distances
    Condensed,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReorderArg {
    /// Matrix JSON file (array of rows, `null` for missing values)
    input: PathBuf,
    /// How to interpret the input matrix: auto, features, square or condensed
    #[arg(long, default_value = "auto")]
    input_kind: InputKind,
    /// Distance metric for feature input
    #[arg(long, default_value_t = Metric::default())]
    metric: Metric,
    /// Linkage method
    #[arg(long, default_value_t = LinkageMethod::default())]
    linkage: LinkageMethod,
    /// Always use the dendrogram order instead of the optimal leaf order
    #[arg(long)]
    no_optimal_ordering: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ReorderArg) -> anyhow::Result<()> {
    let ReorderArg {
        input,
        input_kind,
        metric,
        linkage,
        no_optimal_ordering,
        output,
    } = arg;

    let data = util::read_matrix_file(input)?;
    let reorder_input = match input_kind {
        InputKind::Auto => {
            let inferred = ReorderInput::infer(data.view());
            tracing::info!(kind = kind_name(&inferred), "inferred input kind");
            inferred
        }
        InputKind::Features => ReorderInput::Features(data.view()),
        InputKind::Square => ReorderInput::Square(data.view()),
        InputKind::Condensed => {
            anyhow::ensure!(
                data.nrows() == 1,
                "Condensed input must be a single row, got {} rows",
                data.nrows()
            );
            ReorderInput::Condensed(data.row(0))
        }
    };
    let is_features = matches!(reorder_input, ReorderInput::Features(_));

    let mut options = ReorderOptions {
        metric: *metric,
        linkage: *linkage,
        ..ReorderOptions::default()
    };
    if *no_optimal_ordering {
        options.optimal_ordering_limit = None;
    }

    let reordering = seriate_cluster::reorder::reorder(reorder_input, &options)
        .with_context(|| format!("Failed to reorder {}", input.display()))?;

    let result = ReorderResult {
        generated_at: chrono::Utc::now(),
        metric: is_features.then(|| metric.to_string()),
        linkage: linkage.to_string(),
        leaf_ordering: reordering.leaf_ordering.to_string(),
        order: reordering.order,
        keep: reordering.keep,
        removed: reordering.removed,
        distances: MatrixJson::from_array(reordering.distances.as_square()),
        linkage_tree: reordering
            .tree
            .merges()
            .iter()
            .map(MergeJson::from)
            .collect(),
    };
    Output::save_json(&result, output.clone())
}

fn kind_name(input: &ReorderInput<'_>) -> &'static str {
    match input {
        ReorderInput::Features(_) => "features",
        ReorderInput::Square(_) => "square",
        ReorderInput::Condensed(_) => "condensed",
    }
}
