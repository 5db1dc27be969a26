use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use vstab::{
    analyze_condition, summarize_study, Branch, BusType, ClusterOpt, ModalOptBuilder, Network,
    StudyOpt, VoltageProfile,
};

/// Voltage-stability modal analysis.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Modal analysis of one operating condition
    Modal(ModalArgs),

    /// Cluster critical-bus lists across operating conditions
    Cluster(ClusterArgs),
}

#[derive(Args)]
struct ModalArgs {
    /// Bus CSV file (bus, type, vm, va); type codes 1=PQ, 2=PV, 3=swing
    #[arg(required = true)]
    buses: PathBuf,

    /// Branch admittance CSV file (f_bus, t_bus, g, b)
    #[arg(required = true)]
    branches: PathBuf,

    /// Critical eigenvalues retained for a non-negative spectrum.
    #[arg(long, default_value_t = 1)]
    modes: usize,

    /// Top buses reported per critical mode.
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// Normalized participation factor threshold for critical buses.
    #[arg(long, default_value_t = 0.9)]
    threshold: f64,

    /// Participation factor CSV output file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ClusterArgs {
    /// Critical bus CSV file (oc, bus), one row per critical bus, rows of
    /// one operating condition grouped together
    #[arg(required = true)]
    input: PathBuf,

    /// Similarity ratio at which lists merge into one cluster.
    #[arg(long, default_value_t = 0.8)]
    similarity: f64,

    /// Maximum number of clusters formed.
    #[arg(long, default_value_t = 1000)]
    max_clusters: usize,

    /// Size of the bus frequency table.
    #[arg(long, default_value_t = 5)]
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct BusRecord {
    bus: usize,
    #[serde(rename = "type")]
    bus_type: u8,
    vm: f64,
    va: f64,
}

#[derive(Debug, Deserialize)]
struct CriticalBusRecord {
    oc: usize,
    bus: usize,
}

#[derive(Debug, Serialize)]
struct PfRecord {
    bus: usize,
    raw_pf: f64,
    normalized_pf: f64,
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_level(false)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(_) => {
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Modal(args) => modal(args),
        Commands::Cluster(args) => cluster(args),
    }
}

fn modal(args: &ModalArgs) -> Result<()> {
    let (net, profile) = load_network(&args.buses, &args.branches)?;

    let opt = StudyOpt {
        modal: ModalOptBuilder::default()
            .n_modes(args.modes)
            .n_buses(args.top)
            .build()?,
        pf_threshold: args.threshold,
        ..Default::default()
    };

    let report = analyze_condition(&net, &profile, &opt)?;

    for mode in &report.modal.modes {
        println!(
            "mode {}: eigenvalue {:.6}{:+.6}j",
            mode.eig_index, mode.eigenvalue.re, mode.eigenvalue.im
        );
        for (bus, pf) in mode.critical_buses.iter().zip(&mode.largest_normalized_pf) {
            println!("  bus {:>6}  pf {:.6}", bus, pf);
        }
    }
    println!(
        "critical buses (threshold {}): {:?}",
        args.threshold, report.critical_buses
    );

    if let Some(out_path) = &args.output {
        let mode = report
            .modal
            .modes
            .first()
            .context("no critical mode to write")?;
        let mut wtr = csv::Writer::from_path(out_path)?;
        for (k, &bus) in report.pq.iter().enumerate() {
            wtr.serialize(PfRecord {
                bus,
                raw_pf: mode.raw_pf[k],
                normalized_pf: mode.normalized_pf[k],
            })?;
        }
        wtr.flush()?;
    }

    Ok(())
}

fn cluster(args: &ClusterArgs) -> Result<()> {
    let (per_oc, candidates) = load_critical_buses(&args.input)?;

    let opt = StudyOpt {
        cluster: ClusterOpt {
            similarity: args.similarity,
            max_clusters: args.max_clusters,
        },
        top_n: args.top_n,
        ..Default::default()
    };

    let summary = summarize_study(&per_oc, &candidates, &opt);

    for (i, cluster) in summary.clusters.iter().enumerate() {
        println!(
            "cluster {} ({} conditions): {:?}",
            i, cluster.merged, cluster.buses
        );
    }
    for (bus, freq) in summary.top_buses.iter().zip(&summary.top_frequencies) {
        println!("bus {:>6} critical in {} conditions", bus, freq);
    }

    Ok(())
}

fn load_network(buses: &Path, branches: &Path) -> Result<(Network, VoltageProfile)> {
    let mut bus_ids = Vec::new();
    let mut bus_type = HashMap::new();
    let mut profile = VoltageProfile::new();

    let mut rdr = csv::Reader::from_path(buses)
        .with_context(|| format!("reading {}", buses.display()))?;
    for result in rdr.deserialize() {
        let rec: BusRecord = result?;
        let typ = match rec.bus_type {
            2 => BusType::PV,
            3 => BusType::REF,
            _ => BusType::PQ,
        };
        bus_ids.push(rec.bus);
        bus_type.insert(rec.bus, typ);
        profile.insert(rec.bus, rec.vm, rec.va);
    }

    let mut rdr = csv::Reader::from_path(branches)
        .with_context(|| format!("reading {}", branches.display()))?;
    let edges = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<Branch>, csv::Error>>()?;

    Ok((Network::new(bus_ids, bus_type, edges), profile))
}

/// Reads (oc, bus) rows into per-condition bus lists, row order preserved,
/// and the candidate set: every distinct bus in first-seen order.
fn load_critical_buses(input: &Path) -> Result<(Vec<Vec<usize>>, Vec<usize>)> {
    let mut per_oc: Vec<Vec<usize>> = Vec::new();
    let mut oc_index: HashMap<usize, usize> = HashMap::new();
    let mut candidates: Vec<usize> = Vec::new();

    let mut rdr = csv::Reader::from_path(input)
        .with_context(|| format!("reading {}", input.display()))?;
    for result in rdr.deserialize() {
        let rec: CriticalBusRecord = result?;
        let i = *oc_index.entry(rec.oc).or_insert_with(|| {
            per_oc.push(Vec::new());
            per_oc.len() - 1
        });
        per_oc[i].push(rec.bus);
        if !candidates.contains(&rec.bus) {
            candidates.push(rec.bus);
        }
    }

    Ok((per_oc, candidates))
}
