use std::path::Path;

use anyhow::{bail, Result};
use check_client::ClientConfig;
use check_template::{resolve_pdf_url, BankId, BankUpdate, NewBank};

use super::open_store;

pub fn cmd_banks_list(store_path: &Path) -> Result<()> {
    let store = open_store(store_path)?;
    let banks = store.list_banks();
    if banks.is_empty() {
        println!("No banks in {}", store_path.display());
        return Ok(());
    }

    for bank in &banks {
        let pdf = bank.pdf_url.as_deref().unwrap_or("-");
        let line2 = if bank.positions.has_second_line() {
            "2 lines"
        } else {
            "1 line"
        };
        println!(
            "{}\t{}\t{}\t{}\t{}",
            bank.id, bank.code, bank.name, pdf, line2
        );
    }
    println!("\n({} banks)", banks.len());
    Ok(())
}

pub fn cmd_banks_add(store_path: &Path, code: &str, name: &str, pdf_url: Option<&str>) -> Result<()> {
    let mut store = open_store(store_path)?;
    let bank = store.create_bank(NewBank {
        code: code.to_string(),
        name: name.to_string(),
        pdf_url: pdf_url.map(str::to_string),
    })?;
    println!("Created bank {} ({})", bank.id, bank.code);
    Ok(())
}

pub fn cmd_banks_update(
    store_path: &Path,
    id: BankId,
    code: Option<String>,
    name: Option<String>,
    pdf_url: Option<String>,
    no_pdf: bool,
) -> Result<()> {
    if no_pdf && pdf_url.is_some() {
        bail!("--pdf-url and --no-pdf cannot be used together");
    }

    let update = BankUpdate {
        code,
        name,
        pdf_url: if no_pdf { Some(None) } else { pdf_url.map(Some) },
    };
    if update == BankUpdate::default() {
        bail!("nothing to update for bank {id}");
    }

    let mut store = open_store(store_path)?;
    let bank = store.update_bank(id, update)?;
    println!("Updated bank {} ({})", bank.id, bank.code);
    Ok(())
}

pub fn cmd_banks_remove(store_path: &Path, id: BankId) -> Result<()> {
    let mut store = open_store(store_path)?;
    store.delete_bank(id)?;
    println!("Removed bank {id}");
    Ok(())
}

/// Print where the bank's PDF is fetched from
pub fn cmd_banks_pdf_url(store_path: &Path, client: &ClientConfig, id: BankId) -> Result<()> {
    let store = open_store(store_path)?;
    let bank = store.get_bank(id)?;
    let base = client.base_url()?;

    match resolve_pdf_url(&base, bank.pdf_url.as_deref()) {
        Some(url) => println!("{url}"),
        None => println!("Bank {id} has no PDF"),
    }
    Ok(())
}
