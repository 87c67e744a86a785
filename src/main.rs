use std::panic;

// Import everything from the lib version of ourselves
use axoasset::LocalAsset;
use clap::Parser;
use cli::Cli;
use gdal_repack::locate::SourceMode;
use gdal_repack::{do_repack, RepackConfig};
use miette::Diagnostic;
use thiserror::Error;
use tracing::error;

mod cli;

fn main() {
    let cli = Cli::parse();

    // Init the logger
    tracing_subscriber::fmt::fmt()
        .with_max_level(cli.verbose)
        .with_target(false)
        .without_time()
        .with_ansi(console::colors_enabled_stderr())
        .init();

    // Control how errors are formatted by setting the miette hook
    miette::set_hook(Box::new(move |_| {
        let graphical_theme = if console::colors_enabled_stderr() {
            miette::GraphicalTheme::unicode()
        } else {
            miette::GraphicalTheme::unicode_nocolor()
        };
        Box::new(
            miette::MietteHandlerOpts::new()
                .graphical_theme(graphical_theme)
                .build(),
        )
    }))
    .expect("failed to initialize error handler");

    // Now that miette is set up, use it to format panics.
    panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(msg) = payload.downcast_ref::<&str>() {
            msg
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            &msg[..]
        } else {
            "something went wrong"
        };

        #[derive(Debug, Error, Diagnostic)]
        #[error("{message}")]
        pub struct PanicError {
            pub message: String,
            #[help]
            pub help: Option<String>,
        }

        error!(
            "{:?}",
            miette::Report::from(PanicError {
                message: message.to_owned(),
                help: panic_info
                    .location()
                    .map(|loc| format!("at {}:{}:{}", loc.file(), loc.line(), loc.column())),
            })
            .wrap_err("gdal-repack panicked")
        );
    }));

    let main_result = real_main(&cli);

    let _ = main_result.map_err(|e| {
        error!("{:?}", e);
        std::process::exit(-1);
    });
}

fn real_main(cli: &Cli) -> Result<(), miette::Report> {
    if !cli.discarded.is_empty() {
        tracing::warn!("ignoring extra arguments: {}", cli.discarded.join(" "));
    }

    let mode = if cli.msi {
        SourceMode::Msi
    } else {
        SourceMode::Wheel
    };
    let cfg = RepackConfig {
        mode,
        work_dir: LocalAsset::current_dir()?,
    };

    let produced = do_repack(&cfg)?;
    if produced.is_empty() {
        eprintln!("nothing to repackage (no matching primary artifacts found)");
    }
    Ok(())
}
