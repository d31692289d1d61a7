// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// License plate recognition demo
#[derive(Parser, Debug)]
#[command(name = "plate-vision")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "License plate detection and recognition demo", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the upload-page server (default 127.0.0.1:5000)
    Serve(commands::ServeArgs),

    /// Run the component-style UI (default 127.0.0.1:7860)
    Demo(commands::ServeArgs),

    /// Recognize plates in one image and write the annotated result
    Recognize(commands::RecognizeArgs),

    /// Draw text onto an image with the font fallback chain
    Overlay(commands::OverlayArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    dotenv::dotenv().ok();

    match cli.command {
        Commands::Serve(args) => commands::serve_upload(args).await,
        Commands::Demo(args) => commands::serve_widget(args).await,
        Commands::Recognize(args) => commands::recognize(args).await,
        Commands::Overlay(args) => commands::overlay(args),
    }
}
