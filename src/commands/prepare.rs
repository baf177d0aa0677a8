//! Prepare command: unify and specialize one item

use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use crate::assembler;
use crate::cli::PrepareArgs;
use crate::commands::{self, Status};
use crate::config::{ConfigFile, Overrides, Settings};
use crate::context::PipelineContext;
use crate::error::{PackError, Result, fs};
use crate::unifier::UnifyOptions;

/// Run prepare command
pub fn run(content_root: Option<PathBuf>, args: PrepareArgs) -> Result<Status> {
    let item_path = commands::existing_path(&args.item, "item")?;
    let content_root = match content_root {
        Some(root) => commands::content_root(Some(root))?,
        None => assembler::pack_root_of(&item_path)
            .and_then(|pack_root| pack_root.parent().and_then(|p| p.parent()).map(PathBuf::from))
            .ok_or_else(|| PackError::InvalidInvocation {
                message: format!("'{}' is not inside Packs/", args.item.display()),
            })?,
    };

    let overrides = Overrides {
        marketplace: commands::parse_marketplace(args.marketplace.as_deref())?,
        ..Overrides::default()
    };
    let file = ConfigFile::load(&content_root)?;
    let settings = Settings::resolve(&overrides, file.as_ref())?;
    let strict = settings.strict;
    let ctx = PipelineContext::new(&content_root, settings, Utc::now()).with_unify_options(
        UnifyOptions {
            custom_label: args.custom.clone(),
            stamp_version: true,
            strip_server_fields: false,
        },
    );

    let out_dir = match &args.output {
        Some(dir) => dir.clone(),
        None => item_path
            .parent()
            .map_or_else(|| PathBuf::from("."), PathBuf::from),
    };

    let items = assembler::prepare_item(&ctx, &item_path)?;
    for item in &items {
        let target = out_dir.join(&item.output_name);
        fs::write(&target, item.body.to_text()?)?;
        info!(item = %item.id, marketplace = %ctx.marketplace(), path = %target.display(), "wrote unified item");
        println!("{}", target.display());
    }

    let diagnostics = ctx.diagnostics.snapshot();
    Ok(Status::from_failed(commands::report(&diagnostics, strict)))
}
