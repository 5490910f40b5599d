use clap::{Parser, Subcommand};
use rst_common::db::core::NetDB;
use rst_common::db::parser::pins;
use rst_common::util::config::Config;
use rst_common::util::{generator, logger};
use rst_engine::tree::STree;
use rst_engine::utils::{check, svg};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Build,
    Generate {
        #[arg(long, default_value_t = 100)]
        nets: usize,
        #[arg(long, default_value_t = 8)]
        max_users: usize,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config: Config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    match args.command.unwrap_or(Commands::Build) {
        Commands::Generate { nets, max_users } => {
            prepare_output_dir(&config.input.pins_file)?;
            log::info!("Generating random benchmark...");
            generator::generate_random_pins(
                &config.input.pins_file,
                nets,
                max_users,
                config.input.grid_width,
                config.input.grid_height,
            )?;
        }
        Commands::Build => {
            if !Path::new(&config.input.pins_file).exists() {
                return Err(anyhow::anyhow!(
                    "Input pins file missing: '{}'. Did you run 'generate'?",
                    config.input.pins_file
                ));
            }
            prepare_output_dir(&config.input.output_file)?;

            if let Err(e) = run_build(&config) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn prepare_output_dir(path_str: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path_str).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            log::info!("Creating output directory: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn run_build(config: &Config) -> anyhow::Result<()> {
    let mut db = NetDB::new();

    log::info!("Parsing pins: {}", config.input.pins_file);
    pins::parse(&mut db, &config.input.pins_file)
        .map_err(|e| anyhow::anyhow!("Invalid pins file '{}': {}", config.input.pins_file, e))?;

    log::info!(
        "Building steiner trees for {} nets (alpha = {})...",
        db.num_nets(),
        config.steiner.alpha
    );
    let trees = rst_engine::build_all(&db, &config.steiner).map_err(|e| anyhow::anyhow!(e))?;

    check::run(&trees).map_err(|e| anyhow::anyhow!("Verification Failed: {}", e))?;

    let total_wirelength: i64 = trees.iter().map(|t| t.total_wire_length()).sum();
    let total_steiners: usize = trees
        .iter()
        .map(|t| t.nodes.values().filter(|n| n.port_count == 0).count())
        .sum();
    log::info!(
        "Total wirelength: {} ({} steiner points)",
        total_wirelength,
        total_steiners
    );

    if !config.input.svg_dir.is_empty() {
        std::fs::create_dir_all(&config.input.svg_dir)?;
        log::info!("Dumping SVGs to {}", config.input.svg_dir);
        for (i, tree) in trees.iter().enumerate() {
            let path = format!("{}/{}.svg", config.input.svg_dir, db.nets[i].name);
            svg::dump_svg(tree, &path)?;
        }
    }

    log::info!("Writing trees to {}", config.input.output_file);
    save_trees(&db, &trees, &config.input.output_file)?;

    Ok(())
}

fn save_trees(db: &NetDB, trees: &[STree], filename: &str) -> std::io::Result<()> {
    let mut file = std::fs::File::create(filename)?;

    for (i, tree) in trees.iter().enumerate() {
        writeln!(file, "tree {}", db.nets[i].name)?;
        if let Some(source) = tree.source {
            writeln!(file, "  source {} {}", source.x, source.y)?;
        }
        for (&cell, node) in &tree.nodes {
            if let Some(up) = node.uphill {
                writeln!(file, "  edge {} {} -> {} {}", up.x, up.y, cell.x, cell.y)?;
            }
        }
    }
    Ok(())
}
