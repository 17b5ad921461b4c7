//! Nav command - the menu as the signed-in identity sees it

use anyhow::{bail, Result};
use colored::Colorize;

use finboard_core::services::{visible_entries, Route};

use super::get_context;

pub async fn run(current: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context().await?;
    let state = ctx.auth.state();

    let current_path = match current {
        Some(path) => {
            if Route::from_path(&path).is_none() {
                bail!("Unknown page: {}", path);
            }
            path
        }
        None => Route::Dashboard.path().to_string(),
    };

    // The menu is only rendered for a signed-in identity
    if !state.is_authenticated() {
        if json {
            println!("[]");
        } else {
            println!("Not signed in. Run 'fb login'.");
        }
        return Ok(());
    }

    let items = visible_entries(&current_path, state.privileges.as_ref());

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for item in items {
        if item.active {
            println!("{} {:<14} {}", ">".cyan(), item.label.bold(), item.path.dimmed());
        } else {
            println!("  {:<14} {}", item.label, item.path.dimmed());
        }
    }
    Ok(())
}
