use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use toml::Table;

use crate::sim::config::{Config, GemmConfig, GpuConfig, PolicyKind, RemapConfig, SimConfig};
use crate::sim::top::Sim;

#[derive(Parser)]
#[command(version, about)]
pub struct WgsimArgs {
    #[arg(help = "Path to config.toml")]
    pub config_path: PathBuf,
    #[arg(long, help = "Override M (rows of A and C)")]
    pub m: Option<usize>,
    #[arg(long, help = "Override N (columns of B and C)")]
    pub n: Option<usize>,
    #[arg(long, help = "Override K (reduction dimension)")]
    pub k: Option<usize>,
    #[arg(long, help = "Override remap policy (identity, linear_grouping, custom_block_edge)")]
    pub policy: Option<PolicyKind>,
    #[arg(long, help = "Override linear grouping band width")]
    pub group_size: Option<usize>,
    #[arg(long, help = "Override number of clusters")]
    pub num_clusters: Option<usize>,
    #[arg(long, help = "Override workgroups dispatched per cluster before rotating")]
    pub chunk_size: Option<usize>,
    #[arg(long, help = "Override private cache bytes per cluster")]
    pub private_cache_bytes: Option<u64>,
    #[arg(long, help = "Override shared cache bytes")]
    pub shared_cache_bytes: Option<u64>,
    #[arg(long, help = "Enable log at level (0:none, 1:info, 2:debug)")]
    pub log: Option<u64>,
    #[arg(long, help = "Print the workgroup mapping tables")]
    pub print_mapping: Option<bool>,
    #[arg(long, help = "Also print the unbounded-capacity estimate")]
    pub estimate: Option<bool>,
    #[arg(long, help = "Write the simulation report as JSON to this path")]
    pub results_json: Option<PathBuf>,
}

pub struct Configs {
    pub sim: SimConfig,
    pub gemm: GemmConfig,
    pub gpu: GpuConfig,
    pub remap: RemapConfig,
}

/// Parse the TOML configuration.
/// If `cli_args` is given, override TOML options with CLI arguments.
pub fn load_configs(toml_string: &str, cli_args: Option<&WgsimArgs>) -> anyhow::Result<Configs> {
    let config_table: Table = toml::from_str(toml_string).context("cannot parse config toml")?;
    let mut sim = SimConfig::from_section(config_table.get("sim")).context("bad [sim] section")?;
    let mut gemm =
        GemmConfig::from_section(config_table.get("gemm")).context("bad [gemm] section")?;
    let mut gpu = GpuConfig::from_section(config_table.get("gpu")).context("bad [gpu] section")?;
    let mut remap =
        RemapConfig::from_section(config_table.get("remap")).context("bad [remap] section")?;

    // override toml configs with CLI args
    if let Some(args) = cli_args {
        sim.log_level = args.log.unwrap_or(sim.log_level);
        sim.print_mapping = args.print_mapping.unwrap_or(sim.print_mapping);
        sim.estimate = args.estimate.unwrap_or(sim.estimate);
        if args.results_json.is_some() {
            sim.results_json = args.results_json.clone();
        }
        gemm.m = args.m.unwrap_or(gemm.m);
        gemm.n = args.n.unwrap_or(gemm.n);
        gemm.k = args.k.unwrap_or(gemm.k);
        remap.policy = args.policy.unwrap_or(remap.policy);
        remap.group_size = args.group_size.unwrap_or(remap.group_size);
        gpu.num_clusters = args.num_clusters.unwrap_or(gpu.num_clusters);
        gpu.chunk_size = args.chunk_size.unwrap_or(gpu.chunk_size);
        gpu.private_cache_bytes = args.private_cache_bytes.unwrap_or(gpu.private_cache_bytes);
        gpu.shared_cache_bytes = args.shared_cache_bytes.unwrap_or(gpu.shared_cache_bytes);
    }

    Ok(Configs {
        sim,
        gemm,
        gpu,
        remap,
    })
}

/// Make a Sim object from the TOML configuration.
pub fn make_sim(configs: &Configs) -> anyhow::Result<Sim> {
    let sim = Sim::new(configs.gemm, configs.gpu, configs.remap.to_policy())?;
    Ok(sim)
}

pub fn level_filter(log_level: u64) -> LevelFilter {
    match log_level {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

pub fn run(args: WgsimArgs) -> anyhow::Result<()> {
    let toml_string = fs::read_to_string(&args.config_path)
        .with_context(|| format!("failed to read config file {}", args.config_path.display()))?;
    let configs = load_configs(&toml_string, Some(&args))?;

    env_logger::Builder::new()
        .filter_level(level_filter(configs.sim.log_level))
        .parse_default_env()
        .init();

    let sim = make_sim(&configs)?;
    if configs.sim.print_mapping {
        println!("{}", sim.mapping().render_by_original());
        println!("{}", sim.mapping().render_by_remapped());
    }
    if configs.sim.estimate {
        let est = sim.estimate_unbounded()?;
        println!(
            "unbounded estimate hit-rate(private,shared,backing) ({:.6}, {:.6}, {:.6})",
            est.private, est.shared, est.backing
        );
    }

    let report = sim.simulate()?;
    println!("{}", report);

    if let Some(path) = &configs.sim.results_json {
        let payload = report.to_json_pretty()?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
    }
    Ok(())
}
