use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use fs_err as fs;
use log::{info, warn};

use site_scaffold::cli::Args;
use site_scaffold::config::Config;
use site_scaffold::provider;
use site_scaffold::session::Session;
use site_scaffold::stepper::ProjectState;
use site_scaffold::ux;

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn report(state: &ProjectState, args: &Args) -> anyhow::Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&state.tree.items())?);
        return Ok(());
    }
    if args.mount {
        println!("{}", serde_json::to_string_pretty(&state.tree.mount_tree())?);
        return Ok(());
    }
    ux::show_steps(&state.steps);
    ux::show_tree(state);
    if let Some(p) = args.show.as_deref().or(state.selected.as_deref()) {
        ux::show_file(state, p);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let mut cfg = Config::load_or_default(args.config.as_deref())?;
    args.apply(&mut cfg);

    // ===== REPLAY: saved responses, no provider =====
    if !args.replay.is_empty() {
        let mut state = ProjectState::new();
        for path in &args.replay {
            let text = fs::read_to_string(path)?;
            let adv = state.ingest(&text);
            info!("{}: {} step(s) completed", path, adv.completed.len());
            for (id, e) in &adv.rejected {
                warn!("step {id} skipped: {e}");
            }
        }
        return report(&state, &args);
    }

    let prompt = args
        .prompt
        .clone()
        .context("--prompt is required unless --replay is given")?;

    let prov = provider::make_provider(cfg.provider, &cfg)?;
    let bar = ux::progress_bar(!args.no_progress && !args.json && !args.mount);
    let mut session = Session::new(prov.as_ref(), &cfg, args.debug).with_progress(bar.clone());

    let outcome = session.run(&prompt).await;
    bar.finish_and_clear();

    report(&session.state, &args)?;
    if let Err(e) = outcome {
        eprintln!("\n{} {:#}", "build did not complete:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
