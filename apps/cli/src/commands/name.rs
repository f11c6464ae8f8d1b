//! `mkeep name`.

use crate::commands::args::IdentityArgs;
use anyhow::Result;
use modelkeep_registry::{format_model_basefilename, format_model_filename, Accuracies, SaveFormat};

pub fn execute(
    identity: &IdentityArgs,
    combined: Option<f64>,
    train_val: Option<(f64, f64)>,
    epoch: u32,
    save_format: &str,
) -> Result<()> {
    let save_format: SaveFormat = save_format.parse()?;
    let identity = identity.to_identity()?;

    let Some((train, val)) = train_val else {
        println!("{}", format_model_basefilename(&identity));
        return Ok(());
    };

    let mut accuracies = Accuracies::from_train_val(train, val);
    if let Some(combined) = combined {
        accuracies.combined = combined;
    }
    println!("{}", format_model_filename(&identity, &accuracies, epoch, save_format));
    Ok(())
}
