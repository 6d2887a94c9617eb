use std::path::Path;
use std::time::Instant;

use guidebook::Renderer;
use guidebook::error::Result;
use guidebook::templating::minijinja::MiniJinjaEngine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::discover::Guidewords;
use crate::flags::GuidewordsCmd;

mod flags;
mod config;
mod discover;
mod compile;
mod render;
mod query;
mod util;

pub const CONTENT_DIR: &str = "content";
pub const TEMPLATE_DIR: &str = "templates";
pub const ASSETS_DIR: &str = "assets";
pub const CONFIG_FILE: &str = "config.toml";
pub const GUIDES_FILE: &str = "guides.toml";
pub const RESOURCES_TOML: &str = "resources.toml";
pub const RESOURCES_JSON: &str = "resources.json";

/// Where `search` and `resources` would render to. They never write.
const SCRATCH_DIR: &str = "_site";

fn build(input: &Path, output: &Path) -> Result<()> {
    let start = Instant::now();
    let guidewords = Guidewords::new::<MiniJinjaEngine, _, _>(input, output)?;
    let site = guidewords.discover()?;
    println!("discovery time: {}ms", start.elapsed().as_millis());

    let render = Instant::now();
    let result = guidewords.render_site(&site);
    println!("render time: {}ms", render.elapsed().as_millis());
    println!("total time: {}ms", start.elapsed().as_millis());
    site.visualize();

    let rendered = result?;
    tracing::info!(pages = rendered.len(), "site written to {}", output.display());
    Ok(())
}

fn open(input: &Path) -> Result<Guidewords> {
    Guidewords::new::<MiniJinjaEngine, _, _>(input, input.join(SCRATCH_DIR))
}

fn run(flags: flags::Guidewords) -> Result<()> {
    match flags.subcommand {
        GuidewordsCmd::Build(cmd) => build(&cmd.input, &cmd.output),
        GuidewordsCmd::Search(cmd) => {
            let guidewords = open(&cmd.input)?;
            let guides = guidewords.compile_guides()?;
            print!("{}", query::search(
                guides.as_slice(),
                guidewords.config.labels(),
                cmd.category.as_deref(),
                cmd.query.as_deref(),
            ));

            Ok(())
        }
        GuidewordsCmd::Resources(cmd) => {
            let guidewords = open(&cmd.input)?;
            let resources = guidewords.load_resources()?;
            print!("{}", query::resources(
                resources.as_slice(),
                guidewords.config.labels(),
                cmd.top.as_deref(),
                cmd.sub.as_deref(),
                cmd.third.as_deref(),
            ));

            Ok(())
        }
    }
}

pub fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(flags::Guidewords::from_env_or_exit()) {
        println!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests;
