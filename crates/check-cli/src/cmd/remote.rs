use anyhow::{bail, Result};
use check_client::{BankApi, CalibrationController, CalibrationError, ClientConfig, HttpBankApi};
use check_template::{resolve_pdf_url, BankId, FieldRole, LayoutConfig, PositionProperty};

/// List the banks of the check server
pub async fn cmd_remote_banks(client: &ClientConfig) -> Result<()> {
    let api = HttpBankApi::new(client)?;
    let banks = api.list_banks().await?;

    for bank in &banks {
        let pdf = resolve_pdf_url(api.base_url(), bank.pdf_url.as_deref())
            .map(|u| u.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\t{}\t{}", bank.id, bank.code, bank.name, pdf);
    }
    println!("\n({} banks on {})", banks.len(), api.base_url());
    Ok(())
}

/// Change one position property on the server
pub async fn cmd_remote_set(
    client: &ClientConfig,
    layout: &LayoutConfig,
    id: BankId,
    field: FieldRole,
    property: PositionProperty,
    value: i32,
) -> Result<()> {
    let api = HttpBankApi::new(client)?;
    let mut controller = CalibrationController::new(api, layout.clone());
    controller.load(Some(&id.to_string())).await?;
    if controller.selected_bank().map(|b| b.id) != Some(id) {
        bail!("Bank {id} not found on {}", client.api_base_url);
    }

    controller.edit(field, property, value)?;
    match controller.save().await {
        Ok(()) => {
            println!("Saved {field} of bank {id}");
            Ok(())
        }
        Err(CalibrationError::Save(error)) => bail!("{}", error.user_message()),
        Err(e) => Err(e.into()),
    }
}
