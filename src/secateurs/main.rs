// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use subnet::config::SubnetConfig;
use subnet::pipeline::run;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Cut a SUMO network and its route files down to a bounding box
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network document (*.net.xml)
    #[arg(long)]
    net: PathBuf,
    /// Route documents (*.rou.xml), filtered against the pruned network
    #[arg(long)]
    routes: Vec<PathBuf>,
    /// Directory the pruned documents are written to, under their input names
    #[arg(short, long)]
    output_dir: PathBuf,
    /// RON file with a SubnetConfig
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, allow_negative_numbers = true)]
    xmin: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    xmax: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    ymin: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    ymax: Option<f64>,
    /// Skip re-parsing the output and the closure checks
    #[arg(long)]
    relaxed: bool,
    /// Log the text of every removed element
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Result<SubnetConfig> {
        let mut config = match &self.config {
            Some(path) => SubnetConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SubnetConfig::default(),
        };

        if let Some(xmin) = self.xmin {
            config.bbox.xmin = xmin;
        }
        if let Some(xmax) = self.xmax {
            config.bbox.xmax = xmax;
        }
        if let Some(ymin) = self.ymin {
            config.bbox.ymin = ymin;
        }
        if let Some(ymax) = self.ymax {
            config.bbox.ymax = ymax;
        }
        if self.relaxed {
            config.strict_format_checks = false;
        }
        if self.verbose {
            config.verbose_removal_logging = true;
        }

        config.validate()?;
        Ok(config)
    }
}

fn output_path(output_dir: &Path, input: &Path) -> Result<PathBuf> {
    let Some(name) = input.file_name() else {
        bail!("{} does not name a file", input.display());
    };
    Ok(output_dir.join(name))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.config()?;

    let inputs: Vec<&PathBuf> = std::iter::once(&args.net).chain(args.routes.iter()).collect();

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output dir {}",
            args.output_dir.display()
        )
    })?;

    let mut outputs = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let output = output_path(&args.output_dir, input)?;
        if inputs.iter().any(|other| same_file(other, &output)) {
            bail!(
                "Refusing to overwrite input {} with pruned output",
                output.display()
            );
        }
        if outputs.contains(&output) {
            bail!("Two inputs would both be written to {}", output.display());
        }
        outputs.push(output);
    }

    info!("Using original net xml file at {}", args.net.display());
    let net_xml = fs::read_to_string(&args.net)
        .with_context(|| format!("Unable to read {}", args.net.display()))?;

    let mut route_xmls = Vec::with_capacity(args.routes.len());
    for path in &args.routes {
        info!("Using original rou xml file at {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Unable to read {}", path.display()))?;
        route_xmls.push(text);
    }
    let route_refs: Vec<&str> = route_xmls.iter().map(|text| text.as_str()).collect();

    let result = run(&config, &net_xml, &route_refs).context("Subnetwork extraction failed")?;

    let texts = std::iter::once(&result.net.xml).chain(result.routes.iter().map(|r| &r.xml));

    // nothing is renamed into place until every temporary file is written
    let mut staged = Vec::with_capacity(outputs.len());
    for (output, text) in outputs.iter().zip(texts) {
        let mut tmp_name = output.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, text)
            .with_context(|| format!("Unable to write {}", tmp_path.display()))?;
        staged.push((tmp_path, output));
    }

    for (tmp_path, output) in staged {
        fs::rename(&tmp_path, output)
            .with_context(|| format!("Unable to move {} into place", output.display()))?;
        info!("Wrote {}", output.display());
    }

    if !result.warnings.is_empty() {
        info!(
            "Finished with {} dangling reference warnings",
            result.warnings.len()
        );
    }

    Ok(())
}
