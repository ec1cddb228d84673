use std::path::PathBuf;

use anyhow::Context;
use seriate_normalize::NormalizationSpec;

use crate::{
    schema::{matrix::MatrixJson, output::NormalizedMatrix},
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct NormalizeArg {
    /// Feature matrix JSON file (array of rows, `null` for missing values)
    input: PathBuf,
    /// Normalization to apply [default: sigmoid]
    #[arg(long)]
    spec: Option<NormalizationSpec>,
    /// Rows used to fit the normalization (scaledSQzscore only)
    #[arg(long, value_delimiter = ',')]
    train: Option<Vec<usize>>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &NormalizeArg) -> anyhow::Result<()> {
    let NormalizeArg {
        input,
        spec,
        train,
        output,
    } = arg;

    let features = util::read_matrix_file(input)?;
    let normalized = seriate_normalize::normalize(features.view(), *spec, train.as_deref())
        .with_context(|| format!("Failed to normalize {}", input.display()))?;

    let result = NormalizedMatrix {
        generated_at: chrono::Utc::now(),
        spec: spec.unwrap_or_default().to_string(),
        matrix: MatrixJson::from_array(normalized.view()),
    };
    Output::save_json(&result, output.clone())
}
