mod app;
mod config;
mod flower;
mod geom;
mod hud;
mod input;
mod model;
mod player;
mod render;
mod scene;
mod silhouette;
mod sim;
mod terrain;
mod view;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
